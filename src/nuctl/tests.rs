//! Tests for the `nuctl` root command.

use super::*;
use crate::capture::{CaptureBuffer, InputBuffer};
use crate::error::InvocationError;
use crate::functionconfig::{Config, FunctionState};
use crate::invocation::{ExecutionContext, InvocationRequest};
use crate::traits::RootCommand;
use std::collections::BTreeMap;
use tempfile::TempDir;

struct Harness {
    store: TempDir,
    output: CaptureBuffer,
    input: InputBuffer,
    env: BTreeMap<String, String>,
}

impl Harness {
    fn new() -> Self {
        let store = TempDir::new().unwrap();
        let env = BTreeMap::from([(
            LOCAL_STORE_ENV.to_string(),
            store.path().to_string_lossy().into_owned(),
        )]);
        Self { store, output: CaptureBuffer::new(), input: InputBuffer::new(), env }
    }

    fn run(&self, request: InvocationRequest) -> Result<String, InvocationError> {
        self.output.reset();
        let mut command = root_command();
        command.set_output(Box::new(self.output.clone()));
        command.set_input(Box::new(self.input.clone()));
        let ctx = ExecutionContext::new(request.to_argv("nuctl"), self.env.clone());
        command.execute(&ctx).map(|()| self.output.to_string_lossy())
    }
}

#[test]
fn test_version_uses_context_env() {
    let mut harness = Harness::new();
    harness.env.insert("NUCLIO_LABEL".to_string(), "1.13.0".to_string());

    let output = harness.run(InvocationRequest::new(["version"])).unwrap();
    assert!(output.starts_with("Client version:\nLabel: 1.13.0"));
}

#[test]
fn test_help_is_written_to_output() {
    let harness = Harness::new();
    let mut command = root_command();
    command.set_output(Box::new(harness.output.clone()));
    let ctx = ExecutionContext::new(vec!["nuctl".into(), "--help".into()], harness.env.clone());
    command.execute(&ctx).unwrap();
    assert!(harness.output.to_string_lossy().contains("Usage: nuctl"));
}

#[test]
fn test_parse_error_is_invocation_error() {
    let harness = Harness::new();
    let err = harness.run(InvocationRequest::new(["frobnicate"])).unwrap_err();
    assert!(err.message.contains("frobnicate"));
    assert_eq!(err.exit_code, 2);
}

#[test]
fn test_deploy_then_get_text() {
    let harness = Harness::new();
    let output = harness
        .run(InvocationRequest::new(["deploy", "echo"]).flag("runtime", "python:3.9"))
        .unwrap();
    assert_eq!(output, "Function 'echo' deployed\n");

    let table = harness.run(InvocationRequest::new(["get", "function"])).unwrap();
    let lines: Vec<&str> = table.lines().collect();
    assert!(lines[0].starts_with("NAMESPACE"));
    assert!(lines[1].contains("echo") && lines[1].contains("ready"));
}

#[test]
fn test_get_function_yaml_decodes_as_config() {
    let harness = Harness::new();
    harness.run(InvocationRequest::new(["deploy", "myfunc"]).flag("replicas", "3")).unwrap();

    let yaml = harness
        .run(InvocationRequest::new(["get", "function", "myfunc"]).flag("output", "yaml"))
        .unwrap();
    let config: Config = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(config.meta.name, "myfunc");
    assert_eq!(config.namespace(), "nuclio");
    assert_eq!(config.spec.replicas, Some(3));
}

#[test]
fn test_get_function_json() {
    let harness = Harness::new();
    harness.run(InvocationRequest::new(["deploy", "one"])).unwrap();
    harness.run(InvocationRequest::new(["deploy", "two"])).unwrap();

    let json = harness.run(InvocationRequest::new(["get", "function"]).flag("output", "json")).unwrap();
    let functions: Vec<Function> = serde_json::from_str(&json).unwrap();
    assert_eq!(functions.len(), 2);
    assert_eq!(functions[1].meta.name, "two");
}

#[test]
fn test_get_unknown_function_fails() {
    let harness = Harness::new();
    let err = harness.run(InvocationRequest::new(["get", "function", "ghost"])).unwrap_err();
    assert_eq!(err.message, "function not found: ghost");
}

#[test]
fn test_import_from_stdin() {
    let harness = Harness::new();
    harness.input.push("meta:\n  name: first\n---\nmeta:\n  name: second\n  namespace: staging\n");

    let output = harness.run(InvocationRequest::new(["import", "function"])).unwrap();
    assert_eq!(output, "Function 'first' imported\nFunction 'second' imported\n");

    let table = harness
        .run(InvocationRequest::new(["get", "function", "second"]).flag("namespace", "staging"))
        .unwrap();
    assert!(table.contains("imported"));

    let platform = LocalPlatform::new(harness.store.path());
    let stored = platform.get_functions("nuclio", Some("first")).unwrap();
    assert_eq!(stored[0].status.state, FunctionState::Imported);
}

#[test]
fn test_import_from_file() {
    let harness = Harness::new();
    let path = harness.store.path().join("import.yaml");
    std::fs::write(&path, "meta:\n  name: from-file\nspec:\n  runtime: golang\n").unwrap();

    harness
        .run(InvocationRequest::new(["import", "function"]).flag("file", path.to_string_lossy()))
        .unwrap();
    let yaml = harness
        .run(InvocationRequest::new(["get", "function", "from-file"]).flag("output", "yaml"))
        .unwrap();
    assert!(yaml.contains("state: imported"));
    assert!(yaml.contains("runtime: golang"));
}

#[test]
fn test_import_nothing_fails() {
    let harness = Harness::new();
    let err = harness.run(InvocationRequest::new(["import", "function"])).unwrap_err();
    assert!(err.message.contains("no function configurations"));
}

#[test]
fn test_delete_function() {
    let harness = Harness::new();
    harness.run(InvocationRequest::new(["deploy", "doomed"])).unwrap();

    let output = harness.run(InvocationRequest::new(["delete", "function", "doomed"])).unwrap();
    assert_eq!(output, "Function 'doomed' deleted\n");
    assert!(harness.run(InvocationRequest::new(["get", "function", "doomed"])).is_err());
}

#[test]
fn test_platform_flag_and_env() {
    let mut harness = Harness::new();

    let err = harness
        .run(InvocationRequest::new(["get", "function"]).flag("platform", "kube"))
        .unwrap_err();
    assert_eq!(err.message, "platform not supported: kube");

    harness.env.insert("NUCTL_PLATFORM".to_string(), "kube".to_string());
    assert!(harness.run(InvocationRequest::new(["get", "function"])).is_err());

    let table = harness
        .run(InvocationRequest::new(["get", "function"]).flag("platform", "local"))
        .unwrap();
    assert!(table.starts_with("NAMESPACE"));

    harness.env.insert("NUCTL_PLATFORM".to_string(), "mars".to_string());
    let err = harness.run(InvocationRequest::new(["get", "function"])).unwrap_err();
    assert!(err.message.contains("unknown platform 'mars'"));
}

#[test]
fn test_version_ignores_platform() {
    let mut harness = Harness::new();
    harness.env.insert("NUCTL_PLATFORM".to_string(), "mars".to_string());
    let output = harness.run(InvocationRequest::new(["version"])).unwrap();
    assert!(output.starts_with("Client version:"));
}

#[test]
fn test_every_function_command_checks_platform() {
    let harness = Harness::new();
    let requests = [
        InvocationRequest::new(["deploy", "f"]),
        InvocationRequest::new(["import", "function"]),
        InvocationRequest::new(["get", "function"]),
        InvocationRequest::new(["delete", "function", "f"]),
    ];
    for request in requests {
        let err = harness.run(request.flag("platform", "kube")).unwrap_err();
        assert_eq!(err.message, "platform not supported: kube");
    }
    assert!(std::fs::read_dir(harness.store.path()).unwrap().next().is_none());
}
