//! Command descriptors, field metadata and parameter injection
//!
//! A `CommandDescriptor` is the static declaration of one remote operation:
//! its verb/entity key, the provider api/operation pair it maps to, the
//! field metadata driving the request builder, and the optional lifecycle
//! extension points. Descriptors are built once with `CommandBuilder` and
//! never mutated afterwards; structural mistakes in a declaration (unparsable
//! target path, rule naming an undeclared field) are programming errors and
//! abort descriptor construction.
//!
//! A `CommandInstance` is the short-lived, injected form: decoded field
//! slots belonging to one run.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::adapter::{self, AdapterKind};
use crate::error::{EngineError, ParameterError, ValidationError};
use crate::lifecycle::{AfterHook, BeforeHook, CustomExec, Extractor};
use crate::params::ParamDict;
use crate::path::{parse_path, Segment};
use crate::request::set_at_path;
use crate::rule::{all_of, key, ParamRule};
use crate::validators::Validator;

/// The verb of a command key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Delete,
    Update,
    Attach,
    Detach,
    Check,
    Start,
    Stop,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Action::Create => "create",
            Action::Delete => "delete",
            Action::Update => "update",
            Action::Attach => "attach",
            Action::Detach => "detach",
            Action::Check => "check",
            Action::Start => "start",
            Action::Stop => "stop",
        };
        f.write_str(s)
    }
}

/// Static metadata for one field of a command.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Logical parameter name the caller supplies
    pub name: String,
    /// Path expression into the provider request; `None` for fields that
    /// only feed hooks or custom routines and are never marshaled
    pub target: Option<String>,
    pub adapter: AdapterKind,
    pub required: bool,
    /// One-line parameter doc shown in the generated help
    pub doc: Option<String>,
}

impl FieldSpec {
    /// A field marshaled into the request at `target`.
    pub fn new(name: impl Into<String>, target: impl Into<String>, adapter: AdapterKind) -> Self {
        Self {
            name: name.into(),
            target: Some(target.into()),
            adapter,
            required: false,
            doc: None,
        }
    }

    /// A field held on the instance for hooks/custom routines only.
    pub fn internal(name: impl Into<String>, adapter: AdapterKind) -> Self {
        Self {
            name: name.into(),
            target: None,
            adapter,
            required: false,
            doc: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

/// Declarative parameter contract of one command, consumed by the template
/// layer for static validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamsSpec {
    pub required: Vec<String>,
    pub optional: Vec<String>,
}

/// Static declaration of one remote operation.
pub struct CommandDescriptor {
    action: Action,
    entity: String,
    api: String,
    operation: String,
    fields: Vec<FieldSpec>,
    rule: ParamRule,
    validators: Vec<(String, Validator)>,
    pub(crate) before: Option<BeforeHook>,
    pub(crate) after: Option<AfterHook>,
    pub(crate) extractor: Option<Extractor>,
    pub(crate) custom_exec: Option<CustomExec>,
    pub(crate) simulable: bool,
    /// Pre-parsed target paths, aligned with `fields`
    paths: Vec<Option<Vec<Segment>>>,
}

impl std::fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("key", &self.key())
            .field("api", &self.api)
            .field("operation", &self.operation)
            .field("fields", &self.fields)
            .finish()
    }
}

impl CommandDescriptor {
    /// Start declaring a command. `action` + `entity` form its key.
    pub fn declare(action: Action, entity: impl Into<String>) -> CommandBuilder {
        CommandBuilder {
            action,
            entity: entity.into(),
            api: String::new(),
            operation: String::new(),
            fields: Vec::new(),
            rule: None,
            validators: Vec::new(),
            before: None,
            after: None,
            extractor: None,
            custom_exec: None,
            simulable: false,
        }
    }

    /// Registry key, e.g. `createinstance`.
    pub fn key(&self) -> String {
        format!("{}{}", self.action, self.entity)
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn api(&self) -> &str {
        &self.api
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn rule(&self) -> &ParamRule {
        &self.rule
    }

    /// The declarative parameter contract: which params must be supplied and
    /// which may be.
    pub fn params_spec(&self) -> ParamsSpec {
        ParamsSpec {
            required: self.rule.required_keys(),
            optional: self.rule.optional_keys(),
        }
    }

    /// Human-readable parameter listing generated from the field metadata.
    pub fn params_help(&self) -> String {
        let spec = self.params_spec();
        let mut out = String::new();
        if !spec.required.is_empty() {
            out.push_str("\tRequired params:");
            for name in &spec.required {
                out.push_str(&format!("\n\t\t- {}{}", name, self.doc_suffix(name)));
            }
        }
        if !spec.optional.is_empty() {
            out.push_str(if spec.required.is_empty() {
                "\tParams:"
            } else {
                "\n\tExtra params:"
            });
            for name in &spec.optional {
                out.push_str(&format!("\n\t\t- {}{}", name, self.doc_suffix(name)));
            }
        }
        out
    }

    fn doc_suffix(&self, name: &str) -> String {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .and_then(|f| f.doc.as_deref())
            .map(|d| format!(": {}", d))
            .unwrap_or_default()
    }

    /// Inject and validate without executing. Names listed in `refs` are
    /// produced by not-yet-run steps: they count as supplied, and their
    /// value checks are skipped.
    pub fn validate_command(&self, params: &ParamDict, refs: &[&str]) -> Vec<EngineError> {
        match self.inject(params, refs) {
            Err(errs) => errs.into_iter().map(EngineError::Parameter).collect(),
            Ok(instance) => self
                .validation_errors(&instance, refs)
                .into_iter()
                .map(EngineError::Validation)
                .collect(),
        }
    }

    /// Fill a fresh instance from the parameter dictionary, accumulating
    /// every problem instead of stopping at the first.
    pub(crate) fn inject<'d>(
        &'d self,
        params: &ParamDict,
        refs: &[&str],
    ) -> Result<CommandInstance<'d>, Vec<ParameterError>> {
        let mut keys: Vec<&str> = params.keys().map(String::as_str).collect();
        for r in refs {
            if !keys.contains(r) {
                keys.push(r);
            }
        }

        let report = self.rule.verify(&keys);
        let mut errors = report.errors;
        errors.extend(report.missing.into_iter().map(ParameterError::MissingRequired));

        let mut slots = BTreeMap::new();
        for field in &self.fields {
            let Some(raw) = params.get(&field.name) else {
                continue;
            };
            match adapter::resolve(field.adapter).decode(raw) {
                Ok(decoded) => {
                    slots.insert(field.name.clone(), decoded);
                }
                Err(reason) => errors.push(ParameterError::TypeMismatch {
                    name: field.name.clone(),
                    reason,
                }),
            }
        }

        if errors.is_empty() {
            debug!(command = %self.key(), params = slots.len(), "params injected");
            Ok(CommandInstance {
                descriptor: self,
                slots,
            })
        } else {
            Err(errors)
        }
    }

    /// Cross-field/value validators, accumulated.
    pub(crate) fn validation_errors(
        &self,
        instance: &CommandInstance<'_>,
        refs: &[&str],
    ) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for (param, validator) in &self.validators {
            if refs.contains(&param.as_str()) {
                continue;
            }
            if let Some(value) = instance.field(param) {
                if let Err(reason) = validator(value) {
                    errors.push(ValidationError::new(param.clone(), reason));
                }
            }
        }
        errors
    }

    fn field_path(&self, name: &str) -> Option<&[Segment]> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .and_then(|idx| self.paths[idx].as_deref())
    }
}

/// A live, injected command: decoded field slots for one run.
#[derive(Debug)]
pub struct CommandInstance<'d> {
    descriptor: &'d CommandDescriptor,
    slots: BTreeMap<String, Value>,
}

impl<'d> CommandInstance<'d> {
    pub fn descriptor(&self) -> &'d CommandDescriptor {
        self.descriptor
    }

    /// Decoded value of a field, when the caller supplied it.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.slots.get(name)
    }

    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    /// Overwrite a slot from a hook, e.g. normalizing a value before the
    /// request is built.
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.slots.insert(name.into(), value);
    }

    /// Project the populated slots into a fresh request tree by walking each
    /// field's target path. Building twice yields structurally equal trees.
    pub fn build_request(&self) -> Result<Value, EngineError> {
        let mut root = Value::Object(Default::default());
        for field in &self.descriptor.fields {
            let Some(path) = self.descriptor.field_path(&field.name) else {
                continue;
            };
            if let Some(value) = self.slots.get(&field.name) {
                adapter::resolve(field.adapter).encode(value, &mut root, path)?;
            }
        }
        Ok(root)
    }
}

/// Builder for `CommandDescriptor`. `done()` runs the registration-time
/// checks and panics on declaration mistakes; those are programming errors
/// in the command catalogue, not runtime conditions.
pub struct CommandBuilder {
    action: Action,
    entity: String,
    api: String,
    operation: String,
    fields: Vec<FieldSpec>,
    rule: Option<crate::rule::RuleNode>,
    validators: Vec<(String, Validator)>,
    before: Option<BeforeHook>,
    after: Option<AfterHook>,
    extractor: Option<Extractor>,
    custom_exec: Option<CustomExec>,
    simulable: bool,
}

impl CommandBuilder {
    /// Provider API and operation this command maps to.
    pub fn call(mut self, api: impl Into<String>, operation: impl Into<String>) -> Self {
        self.api = api.into();
        self.operation = operation.into();
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Override the default required/optional rule with a richer contract.
    pub fn rule(mut self, tree: crate::rule::RuleNode) -> Self {
        self.rule = Some(tree);
        self
    }

    /// Value validator for one parameter.
    pub fn validate(mut self, param: impl Into<String>, validator: Validator) -> Self {
        self.validators.push((param.into(), validator));
        self
    }

    /// Runs after validation, before any remote effect. A failure here
    /// aborts the run.
    pub fn before_hook(mut self, hook: BeforeHook) -> Self {
        self.before = Some(hook);
        self
    }

    /// Runs with the raw provider response after extraction. May invoke
    /// other commands (bounded follow-up calls).
    pub fn after_hook(mut self, hook: AfterHook) -> Self {
        self.after = Some(hook);
        self
    }

    /// Produce the single loggable identifier from the raw response.
    pub fn extract(mut self, extractor: Extractor) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Replace the generic build-and-call path with a custom routine for
    /// operations needing multiple dependent calls or local side effects.
    pub fn custom(mut self, exec: CustomExec) -> Self {
        self.custom_exec = Some(exec);
        self
    }

    /// The provider supports the simulate marker for this operation.
    pub fn simulable(mut self) -> Self {
        self.simulable = true;
        self
    }

    pub fn done(self) -> CommandDescriptor {
        let keyname = format!("{}{}", self.action, self.entity);

        // All targets are probed into one shared tree, so conflicting
        // shapes between a declaration's fields surface at registration.
        let mut probe = Value::Object(Default::default());
        let mut paths = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            match &field.target {
                None => paths.push(None),
                Some(target) => match parse_path(target) {
                    Ok(segments) => {
                        if let Err(e) = set_at_path(&mut probe, &segments, Value::Null) {
                            panic!("command '{}': field '{}': {}", keyname, field.name, e);
                        }
                        paths.push(Some(segments));
                    }
                    Err(e) => panic!("command '{}': field '{}': {}", keyname, field.name, e),
                },
            }
        }

        let rule = match self.rule {
            Some(tree) => {
                // Fields the custom rule does not name stay accepted as
                // hook-only extras.
                let named = tree.all_keys();
                let extras: Vec<String> = self
                    .fields
                    .iter()
                    .map(|f| f.name.clone())
                    .filter(|n| !named.contains(n))
                    .collect();
                ParamRule::new(tree).with_extras(extras)
            }
            None => {
                // Default contract straight from the required flags.
                let required: Vec<_> = self
                    .fields
                    .iter()
                    .filter(|f| f.required)
                    .map(|f| key(f.name.clone()))
                    .collect();
                let optional: Vec<String> = self
                    .fields
                    .iter()
                    .filter(|f| !f.required)
                    .map(|f| f.name.clone())
                    .collect();
                ParamRule::new(all_of(required)).with_extras(optional)
            }
        };

        // Every accepted parameter must have a field to decode through, and
        // every validator must refer to a declared field.
        for name in rule.accepted_keys() {
            if !self.fields.iter().any(|f| f.name == name) {
                panic!("command '{}': rule names undeclared field '{}'", keyname, name);
            }
        }
        for (param, _) in &self.validators {
            if !self.fields.iter().any(|f| &f.name == param) {
                panic!(
                    "command '{}': validator on undeclared field '{}'",
                    keyname, param
                );
            }
        }
        if self.operation.is_empty() && self.custom_exec.is_none() {
            panic!(
                "command '{}': declares neither a provider call nor a custom routine",
                keyname
            );
        }

        CommandDescriptor {
            action: self.action,
            entity: self.entity,
            api: self.api,
            operation: self.operation,
            fields: self.fields,
            rule,
            validators: self.validators,
            before: self.before,
            after: self.after,
            extractor: self.extractor,
            custom_exec: self.custom_exec,
            simulable: self.simulable,
            paths,
        }
    }
}
