//! Shared fixtures: a scripted in-memory provider and a small command
//! catalogue resembling a real control-plane binding.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use serde_json::Value;

use opspec::{
    Action, AdapterKind, CommandDescriptor, CommandRegistry, FieldSpec, Provider, ProviderCall,
    ProviderError,
};
use opspec::{all_of, key, one_of_required};

/// One recorded outgoing call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub api: String,
    pub operation: String,
    pub payload: Value,
    pub dry_run: bool,
}

/// In-memory transport with per-operation scripted results. Unscripted
/// operations succeed with an empty object.
#[derive(Default)]
pub struct FakeProvider {
    results: Mutex<HashMap<String, Vec<Result<Value, ProviderError>>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next result for `operation`; results are consumed FIFO.
    pub fn script(&self, operation: &str, result: Result<Value, ProviderError>) {
        self.results
            .lock()
            .unwrap()
            .entry(operation.to_string())
            .or_default()
            .push(result);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, operation: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.operation == operation)
            .collect()
    }
}

impl Provider for FakeProvider {
    fn call(&self, call: &ProviderCall<'_>) -> Result<Value, ProviderError> {
        self.calls.lock().unwrap().push(RecordedCall {
            api: call.api.to_string(),
            operation: call.operation.to_string(),
            payload: call.payload.clone(),
            dry_run: call.dry_run,
        });
        let mut results = self.results.lock().unwrap();
        match results.get_mut(call.operation) {
            Some(queue) if !queue.is_empty() => queue.remove(0),
            _ => Ok(Value::Object(Default::default())),
        }
    }
}

fn extract(field: &'static str) -> opspec::Extractor {
    Arc::new(move |out: &Value| out.get(field).and_then(Value::as_str).map(String::from))
}

/// A catalogue with the shapes the engine has to handle: required fields,
/// alternative groups, hook-only params, nested and indexed targets.
pub fn sample_registry() -> CommandRegistry {
    CommandRegistry::builder()
        .register(
            CommandDescriptor::declare(Action::Create, "instance")
                .call("compute", "RunInstances")
                .field(FieldSpec::new("image", "ImageId", AdapterKind::Str).required())
                .field(FieldSpec::new("type", "InstanceType", AdapterKind::Str).required())
                .field(FieldSpec::new("subnet", "SubnetId", AdapterKind::Str))
                .field(FieldSpec::new("count", "MaxCount", AdapterKind::Int))
                .field(FieldSpec::new(
                    "securitygroup",
                    "SecurityGroupIds",
                    AdapterKind::StringList,
                ))
                .field(FieldSpec::new(
                    "role",
                    "IamInstanceProfile.Name",
                    AdapterKind::Str,
                ))
                .field(FieldSpec::internal("name", AdapterKind::Str))
                .rule(all_of([
                    key("image"),
                    key("type"),
                    one_of_required([key("subnet"), key("count")]),
                ]))
                .extract(extract("InstanceId"))
                .after_hook(Arc::new(|instance, env, out| {
                    // Tag the new instance with its name in a follow-up call.
                    if let (Some(name), Some(id)) = (
                        instance.field_str("name"),
                        out.get("InstanceId").and_then(Value::as_str),
                    ) {
                        env.provider
                            .call(&ProviderCall {
                                api: "compute",
                                operation: "CreateTags",
                                payload: &serde_json::json!({
                                    "Resources": [id],
                                    "Tags": [{"Key": "Name", "Value": name}],
                                }),
                                dry_run: false,
                            })
                            .map_err(anyhow::Error::from)?;
                    }
                    Ok(())
                }))
                .simulable()
                .done(),
        )
        .register(
            CommandDescriptor::declare(Action::Delete, "instance")
                .call("compute", "TerminateInstances")
                .field(FieldSpec::new("id", "InstanceIds", AdapterKind::StringList).required())
                .simulable()
                .done(),
        )
        .register(
            CommandDescriptor::declare(Action::Create, "queue")
                .call("messaging", "CreateQueue")
                .field(FieldSpec::new("name", "QueueName", AdapterKind::Str).required())
                .field(FieldSpec::new(
                    "delay",
                    "Attributes[DelaySeconds]",
                    AdapterKind::MapEntry,
                ))
                .extract(extract("QueueUrl"))
                .done(),
        )
        .register(
            CommandDescriptor::declare(Action::Create, "loadbalancer")
                .call("lb", "CreateLoadBalancer")
                .field(FieldSpec::new("name", "Name", AdapterKind::Str).required())
                .field(FieldSpec::new(
                    "port",
                    "Listeners[0].Port",
                    AdapterKind::StructList,
                ))
                .field(FieldSpec::new(
                    "protocol",
                    "Listeners[0].Protocol",
                    AdapterKind::StructList,
                ))
                .extract(extract("LoadBalancerArn"))
                .done(),
        )
        .build()
}

/// Route test logs through the usual subscriber once per binary.
pub fn init_tracing() {
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_test_writer()
            .try_init()
            .ok();
    });
}
