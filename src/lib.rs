//! Declarative command engine for remote control-plane APIs
//!
//! Commands are declared once as `CommandDescriptor`s: a verb/entity key,
//! field metadata mapping caller params onto request-tree paths through
//! type adapters, a parameter rule contract, and optional lifecycle hooks.
//! Running a command injects and validates the caller's flat parameter
//! dictionary, builds the provider request, issues it through a pluggable
//! synchronous `Provider`, and extracts the resulting identifier.
//!
//! Two companions round the engine out: a dry-run mode that simulates
//! whole runs without side effects, and a `Checker` that polls remote
//! state until a mutation has actually converged.
//!
//! ```no_run
//! use std::sync::Arc;
//! use opspec::{
//!     Action, AdapterKind, CommandDescriptor, FieldSpec, Provider,
//!     ProviderCall, ProviderError, RunEnv,
//! };
//! use opspec::params::params;
//! use serde_json::Value;
//!
//! struct HttpProvider;
//! impl Provider for HttpProvider {
//!     fn call(&self, _call: &ProviderCall<'_>) -> Result<Value, ProviderError> {
//!         // speak the provider's wire protocol here
//!         Ok(Value::Null)
//!     }
//! }
//!
//! let create_volume = CommandDescriptor::declare(Action::Create, "volume")
//!     .call("storage", "CreateVolume")
//!     .field(FieldSpec::new("zone", "AvailabilityZone", AdapterKind::Str).required())
//!     .field(FieldSpec::new("size", "Size", AdapterKind::Int).required())
//!     .extract(Arc::new(|out| {
//!         out.get("VolumeId").and_then(Value::as_str).map(String::from)
//!     }))
//!     .done();
//!
//! let provider = HttpProvider;
//! let mut env = RunEnv::new(&provider);
//! let _id = create_volume
//!     .run(&mut env, &params([("zone", "eu-west-1a"), ("size", "10")]))
//!     .unwrap();
//! ```

pub mod adapter;
pub mod check;
pub mod command;
pub mod dryrun;
pub mod error;
pub mod lifecycle;
pub mod params;
pub mod path;
pub mod provider;
pub mod registry;
pub mod request;
pub mod rule;
pub mod suggest;
pub mod validators;

pub use adapter::{AdapterKind, TypeAdapter};
pub use check::{Checker, NOT_FOUND_STATE};
pub use command::{Action, CommandBuilder, CommandDescriptor, CommandInstance, FieldSpec, ParamsSpec};
pub use dryrun::placeholder_id;
pub use error::{CheckError, EngineError, ParameterError, ValidationError};
pub use lifecycle::{AfterHook, BeforeHook, Context, CustomExec, Extractor, RunEnv};
pub use params::{ParamDict, ParamValue};
pub use provider::{Provider, ProviderCall, ProviderError};
pub use registry::{CommandRegistry, RegistryBuilder};
pub use rule::{all_of, key, one_of, one_of_required, ParamRule, RuleNode};
