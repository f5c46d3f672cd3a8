//! Run orchestration
//!
//! Every command executes through the same fixed pipeline on the caller's
//! thread: inject, validate, before hook, remote call (or custom routine),
//! extract, log, after hook. The first failing stage aborts the run; once
//! the remote call has been issued the engine never retries or rolls back.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::command::{CommandDescriptor, CommandInstance};
use crate::error::EngineError;
use crate::params::ParamDict;
use crate::provider::{Provider, ProviderCall};

/// Shared mutable state hooks may read and write across the steps of one
/// template run, keyed by arbitrary names.
pub type Context = HashMap<String, Value>;

/// Everything one run needs from its surroundings.
pub struct RunEnv<'p> {
    pub provider: &'p dyn Provider,
    pub context: Context,
    /// Route every command through the simulation path
    pub dry_run: bool,
}

impl<'p> RunEnv<'p> {
    pub fn new(provider: &'p dyn Provider) -> Self {
        Self {
            provider,
            context: Context::new(),
            dry_run: false,
        }
    }

    pub fn dry(mut self) -> Self {
        self.dry_run = true;
        self
    }
}

/// Runs after validation and before any remote effect; a failure aborts the
/// run with nothing sent.
pub type BeforeHook =
    Arc<dyn Fn(&mut CommandInstance<'_>, &mut RunEnv<'_>) -> anyhow::Result<()> + Send + Sync>;

/// Runs last, with the raw provider response. May issue bounded follow-up
/// calls through the environment's provider.
pub type AfterHook = Arc<
    dyn Fn(&CommandInstance<'_>, &mut RunEnv<'_>, &Value) -> anyhow::Result<()> + Send + Sync,
>;

/// Pulls the single loggable identifier out of the raw response.
pub type Extractor = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Replaces the generic build-and-call stage for commands that need several
/// dependent calls or local side effects.
pub type CustomExec = Arc<
    dyn Fn(&CommandInstance<'_>, &mut RunEnv<'_>) -> anyhow::Result<Value> + Send + Sync,
>;

impl CommandDescriptor {
    /// Execute the command against `env.provider`, returning the extracted
    /// identifier when the command produces one.
    ///
    /// Blocks the caller's thread for the duration of the run.
    pub fn run(
        &self,
        env: &mut RunEnv<'_>,
        params: &ParamDict,
    ) -> Result<Option<String>, EngineError> {
        if env.dry_run {
            return self.dry_run(env, params);
        }

        let mut instance = self.prepare(params)?;

        if let Some(before) = self.before.clone() {
            before(&mut instance, env)
                .map_err(|e| EngineError::execution(self.key(), e.context("before hook")))?;
        }

        let output = self.execute(&instance, env, false)?;

        let extracted = self.extract_result(&output);

        info!(
            "{} {} '{}' done",
            self.action(),
            self.entity(),
            extracted.as_deref().unwrap_or("")
        );

        if let Some(after) = self.after.clone() {
            after(&instance, env, &output)
                .map_err(|e| EngineError::execution(self.key(), e.context("after hook")))?;
        }

        Ok(extracted)
    }

    /// Inject and validate, collapsing accumulated problems into one error.
    pub(crate) fn prepare<'d>(
        &'d self,
        params: &ParamDict,
    ) -> Result<CommandInstance<'d>, EngineError> {
        let instance = self
            .inject(params, &[])
            .map_err(EngineError::from_parameter_errors)?;
        let validation = self.validation_errors(&instance, &[]);
        if !validation.is_empty() {
            return Err(EngineError::from_validation_errors(validation));
        }
        Ok(instance)
    }

    /// The remote stage: custom routine when declared, otherwise build the
    /// request and call the provider.
    pub(crate) fn execute(
        &self,
        instance: &CommandInstance<'_>,
        env: &mut RunEnv<'_>,
        dry_run: bool,
    ) -> Result<Value, EngineError> {
        if let Some(custom) = self.custom_exec.clone() {
            return custom(instance, env).map_err(|e| EngineError::execution(self.key(), e));
        }

        let payload = instance.build_request()?;
        env.provider
            .call(&ProviderCall {
                api: self.api(),
                operation: self.operation(),
                payload: &payload,
                dry_run,
            })
            .map_err(|e| EngineError::execution(self.key(), e))
    }

    pub(crate) fn extract_result(&self, output: &Value) -> Option<String> {
        let extractor = self.extractor.as_ref()?;
        let extracted = extractor(output);
        if extracted.is_none() {
            warn!(command = %self.key(), "no result extracted from response");
        }
        extracted
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::adapter::AdapterKind;
    use crate::command::{Action, FieldSpec};
    use crate::params::params;
    use crate::provider::ProviderError;

    /// Scripted transport recording every call it receives.
    struct ScriptedProvider {
        calls: Mutex<Vec<(String, String, Value, bool)>>,
        result: Result<Value, ProviderError>,
    }

    impl ScriptedProvider {
        fn returning(result: Result<Value, ProviderError>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                result,
            }
        }
    }

    impl Provider for ScriptedProvider {
        fn call(&self, call: &ProviderCall<'_>) -> Result<Value, ProviderError> {
            self.calls.lock().unwrap().push((
                call.api.to_string(),
                call.operation.to_string(),
                call.payload.clone(),
                call.dry_run,
            ));
            self.result.clone()
        }
    }

    fn create_volume() -> CommandDescriptor {
        CommandDescriptor::declare(Action::Create, "volume")
            .call("storage", "CreateVolume")
            .field(FieldSpec::new("zone", "AvailabilityZone", AdapterKind::Str).required())
            .field(FieldSpec::new("size", "Size", AdapterKind::Int).required())
            .extract(Arc::new(|out| {
                out.get("VolumeId").and_then(Value::as_str).map(String::from)
            }))
            .simulable()
            .done()
    }

    #[test]
    fn run_builds_calls_and_extracts() {
        let provider = ScriptedProvider::returning(Ok(json!({"VolumeId": "vol-1234"})));
        let mut env = RunEnv::new(&provider);
        let cmd = create_volume();

        let id = cmd
            .run(&mut env, &params([("zone", "eu-west-1a"), ("size", "10")]))
            .unwrap();
        assert_eq!(id.as_deref(), Some("vol-1234"));

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (api, op, payload, dry) = &calls[0];
        assert_eq!(api, "storage");
        assert_eq!(op, "CreateVolume");
        assert_eq!(payload, &json!({"AvailabilityZone": "eu-west-1a", "Size": 10}));
        assert!(!dry);
    }

    #[test]
    fn failing_before_hook_aborts_with_nothing_sent() {
        let provider = ScriptedProvider::returning(Ok(json!({})));
        let mut env = RunEnv::new(&provider);
        let cmd = CommandDescriptor::declare(Action::Create, "volume")
            .call("storage", "CreateVolume")
            .field(FieldSpec::new("zone", "AvailabilityZone", AdapterKind::Str).required())
            .before_hook(Arc::new(|_, _| anyhow::bail!("zone not allowed")))
            .done();

        let err = cmd
            .run(&mut env, &params([("zone", "eu-west-1a")]))
            .unwrap_err();
        assert!(matches!(err, EngineError::Execution { .. }));
        assert!(provider.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn provider_rejection_surfaces_as_execution_error() {
        let provider = ScriptedProvider::returning(Err(ProviderError::new(
            "VolumeLimitExceeded",
            "too many volumes",
        )));
        let mut env = RunEnv::new(&provider);

        let err = create_volume()
            .run(&mut env, &params([("zone", "eu-west-1a"), ("size", "10")]))
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("createvolume:"), "got: {}", msg);
        assert!(err.to_string().contains("createvolume"));
    }

    #[test]
    fn parameter_problems_abort_before_any_call() {
        let provider = ScriptedProvider::returning(Ok(json!({})));
        let mut env = RunEnv::new(&provider);

        let err = create_volume()
            .run(&mut env, &params([("zone", "eu-west-1a")]))
            .unwrap_err();
        assert!(matches!(err, EngineError::Parameter(_)));
        assert!(provider.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn custom_routine_replaces_the_generic_call() {
        let provider = ScriptedProvider::returning(Ok(json!({})));
        let mut env = RunEnv::new(&provider);
        let cmd = CommandDescriptor::declare(Action::Update, "policy")
            .field(FieldSpec::new("arn", "PolicyArn", AdapterKind::Str).required())
            .custom(Arc::new(|instance, _| {
                Ok(json!({"Arn": instance.field_str("arn")}))
            }))
            .extract(Arc::new(|out| {
                out.get("Arn").and_then(Value::as_str).map(String::from)
            }))
            .done();

        let id = cmd
            .run(&mut env, &params([("arn", "res:policy/admin")]))
            .unwrap();
        assert_eq!(id.as_deref(), Some("res:policy/admin"));
        assert!(provider.calls.lock().unwrap().is_empty());
    }
}
