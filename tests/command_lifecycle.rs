//! End-to-end runs through the registry: injection, request building,
//! provider calls, extraction and hooks.

mod helpers;

use serde_json::json;

use helpers::{init_tracing, sample_registry, FakeProvider};
use opspec::params::params;
use opspec::{EngineError, ParameterError, RunEnv};

#[test]
fn create_instance_marshals_nested_and_list_fields() {
    init_tracing();
    let registry = sample_registry();
    let provider = FakeProvider::new();
    provider.script("RunInstances", Ok(json!({"InstanceId": "i-0abc"})));
    let mut env = RunEnv::new(&provider);

    let cmd = registry.get("createinstance").unwrap();
    let id = cmd
        .run(
            &mut env,
            &params([
                ("image", opspec::ParamValue::from("img-1234")),
                ("type", "m5.large".into()),
                ("subnet", "subnet-99".into()),
                ("securitygroup", vec!["sg-1", "sg-2"].into()),
                ("role", "webserver".into()),
            ]),
        )
        .unwrap();

    assert_eq!(id.as_deref(), Some("i-0abc"));
    let calls = provider.calls_to("RunInstances");
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].payload,
        json!({
            "ImageId": "img-1234",
            "InstanceType": "m5.large",
            "SubnetId": "subnet-99",
            "SecurityGroupIds": ["sg-1", "sg-2"],
            "IamInstanceProfile": {"Name": "webserver"},
        })
    );
}

#[test]
fn after_hook_issues_the_follow_up_call() {
    init_tracing();
    let registry = sample_registry();
    let provider = FakeProvider::new();
    provider.script("RunInstances", Ok(json!({"InstanceId": "i-0abc"})));
    let mut env = RunEnv::new(&provider);

    registry
        .get("createinstance")
        .unwrap()
        .run(
            &mut env,
            &params([
                ("image", "img-1234"),
                ("type", "m5.large"),
                ("subnet", "subnet-99"),
                ("name", "frontend"),
            ]),
        )
        .unwrap();

    let tag_calls = provider.calls_to("CreateTags");
    assert_eq!(tag_calls.len(), 1);
    assert_eq!(
        tag_calls[0].payload,
        json!({
            "Resources": ["i-0abc"],
            "Tags": [{"Key": "Name", "Value": "frontend"}],
        })
    );
    // Hook-only param never reaches the main request.
    assert!(provider.calls_to("RunInstances")[0]
        .payload
        .get("name")
        .is_none());
}

#[test]
fn alternative_group_wants_at_least_one_member() {
    let registry = sample_registry();
    let provider = FakeProvider::new();
    let mut env = RunEnv::new(&provider);

    let err = registry
        .get("createinstance")
        .unwrap()
        .run(&mut env, &params([("image", "img-1234"), ("type", "t2.micro")]))
        .unwrap_err();

    assert!(err.to_string().contains("expecting (\"subnet\" or \"count\")"));
    assert!(provider.calls().is_empty());
}

#[test]
fn every_parameter_problem_reports_in_one_pass() {
    let registry = sample_registry();
    let cmd = registry.get("createinstance").unwrap();

    let errs = cmd.validate_command(
        &params([("imaeg", opspec::ParamValue::from("img-1")), ("count", 2.into())]),
        &[],
    );
    // Unknown key with suggestion, plus the two missing required params.
    assert_eq!(errs.len(), 3);
    let rendered: Vec<String> = errs.iter().map(ToString::to_string).collect();
    assert!(rendered
        .iter()
        .any(|m| m.contains("unexpected 'imaeg' param, did you mean 'image'?")));
    assert!(rendered.iter().any(|m| m.contains("missing required param 'image'")));
    assert!(rendered.iter().any(|m| m.contains("missing required param 'type'")));
}

#[test]
fn references_to_later_steps_satisfy_validation() {
    let registry = sample_registry();
    let cmd = registry.get("createinstance").unwrap();

    let errs = cmd.validate_command(&params([("type", "t2.micro")]), &["image", "subnet"]);
    assert!(errs.is_empty(), "got: {:?}", errs);
}

#[test]
fn type_mismatch_names_the_param() {
    let registry = sample_registry();
    let provider = FakeProvider::new();
    let mut env = RunEnv::new(&provider);

    let err = registry
        .get("createinstance")
        .unwrap()
        .run(
            &mut env,
            &params([
                ("image", "img-1234"),
                ("type", "t2.micro"),
                ("count", "lots"),
            ]),
        )
        .unwrap_err();

    match err {
        EngineError::Parameter(ParameterError::TypeMismatch { name, reason }) => {
            assert_eq!(name, "count");
            assert!(reason.contains("invalid integer value 'lots'"));
        }
        other => panic!("expected type mismatch, got {:?}", other),
    }
}

#[test]
fn unknown_command_suggests_the_closest_key() {
    let registry = sample_registry();
    match registry.get("createinstnce") {
        Err(EngineError::UnknownCommand { suggestion, .. }) => {
            assert_eq!(suggestion.as_deref(), Some("createinstance"));
        }
        other => panic!("expected unknown command, got {:?}", other.err()),
    }
}

#[test]
fn params_help_lists_required_then_extras() {
    let registry = sample_registry();
    let cmd = registry.get("createinstance").unwrap();
    let spec = cmd.params_spec();
    assert_eq!(spec.required, vec!["image", "type"]);
    for name in ["subnet", "count", "securitygroup", "role", "name"] {
        assert!(spec.optional.contains(&name.to_string()), "missing {}", name);
    }

    let help = cmd.params_help();
    let required_at = help.find("Required params:").unwrap();
    let extra_at = help.find("Extra params:").unwrap();
    assert!(required_at < extra_at);
}
