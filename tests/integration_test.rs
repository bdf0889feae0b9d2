//! Integration tests for `nuctl_harness`, driving the real `nuctl` root command.

use nuctl_harness::command::ShellRunner;
use nuctl_harness::config::HarnessConfig;
use nuctl_harness::nuctl::{root_command, LOCAL_STORE_ENV};
use nuctl_harness::suite::PLATFORM_ENV;
use nuctl_harness::testing::MockCommandRunner;
use nuctl_harness::traits::{CommandOutput, CommandRunner};
use nuctl_harness::{Error, InvocationRequest, Suite, VERSION};
use std::rc::Rc;
use std::time::Duration;
use tempfile::TempDir;

fn docker_runner() -> Rc<dyn CommandRunner> {
    let mut runner = MockCommandRunner::new();
    runner.expect(
        "docker",
        &["version", "--format", "{{.Server.Version}}"],
        CommandOutput { exit_code: 0, stdout: "24.0.7\n".to_string(), stderr: String::new() },
    );
    Rc::new(runner)
}

fn setup(store: &TempDir) -> Suite {
    let mut suite = Suite::builder(root_command)
        .config(HarnessConfig { echo_output: false, ..Default::default() })
        .shell_runner(|| Ok(docker_runner()))
        .wait(Duration::from_secs(1), Duration::from_millis(100))
        .build()
        .unwrap();
    suite.set_env(LOCAL_STORE_ENV, store.path().to_string_lossy());
    suite.setup_test();
    suite
}

#[test]
fn test_version_exists() {
    assert!(!VERSION.is_empty());
}

#[test]
fn test_shell_runner_runs_command_line() {
    let runner = ShellRunner::new().unwrap();
    let output = runner.run_shell("echo hello", None).unwrap();
    assert!(output.success());
    assert!(output.stdout.contains("hello"));
}

#[test]
#[serial_test::serial]
fn test_import_fixture_and_assert_imported() {
    std::env::remove_var(PLATFORM_ENV);
    let store = TempDir::new().unwrap();
    let mut suite = setup(&store);

    let fixture = suite.imports_dir().join("functions.yaml");
    suite
        .execute(&InvocationRequest::new(["import", "function"]).flag("file", fixture.to_string_lossy()))
        .unwrap();
    suite.assert_patterns_in_output(&["imported-echo", "imported-hello"], &["error"]);

    suite.assert_function_imported("imported-echo", true);
    suite.assert_function_imported("imported-hello", true);

    suite.teardown_suite().unwrap();
    assert!(std::env::var_os(PLATFORM_ENV).is_none());
}

#[test]
#[serial_test::serial]
fn test_deployed_function_is_not_imported() {
    let store = TempDir::new().unwrap();
    let mut suite = setup(&store);

    let config = suite.function_configs_dir().join("echo.yaml");
    suite
        .execute(
            &InvocationRequest::new(["deploy", "echo"]).flag("file", config.to_string_lossy()),
        )
        .unwrap();

    suite.assert_function_imported("echo", false);
    let err = suite.try_assert_function_imported("echo", true).unwrap_err();
    assert!(matches!(err, Error::PatternMismatch(_)));
}

#[test]
#[serial_test::serial]
fn test_import_from_preloaded_stdin() {
    let store = TempDir::new().unwrap();
    let mut suite = setup(&store);

    suite.write_input("meta:\n  name: piped\n");
    suite.execute(&InvocationRequest::new(["import", "function"])).unwrap();

    suite.assert_function_imported("piped", true);
}

#[test]
#[serial_test::serial]
fn test_wait_for_deletion() {
    let store = TempDir::new().unwrap();
    let mut suite = setup(&store);

    suite.execute(&InvocationRequest::new(["deploy", "short-lived"])).unwrap();
    suite.execute(&InvocationRequest::new(["delete", "function", "short-lived"])).unwrap();

    suite
        .execute_and_wait(&InvocationRequest::new(["get", "function", "short-lived"]), true)
        .unwrap();
}

#[test]
#[serial_test::serial]
fn test_missing_function_times_out() {
    let store = TempDir::new().unwrap();
    let mut suite = setup(&store);

    let err = suite.try_assert_function_imported("ghost", false).unwrap_err();
    match err {
        Error::Timeout { last_error, .. } => {
            assert_eq!(last_error.as_deref(), Some("function not found: ghost"));
        }
        other => panic!("expected timeout, got {other}"),
    }
}

#[test]
#[serial_test::serial]
fn test_listing_after_reset_shows_only_new_output() {
    let store = TempDir::new().unwrap();
    let mut suite = setup(&store);

    suite.execute(&InvocationRequest::new(["deploy", "alpha"])).unwrap();
    suite.reset_output();
    suite.execute(&InvocationRequest::new(["get", "function"])).unwrap();

    suite.assert_patterns_in_output(&["NAMESPACE", "alpha", "ready"], &["deployed"]);
    assert_eq!(suite.last_args().unwrap(), ["nuctl", "get", "function"]);
}

#[test]
#[serial_test::serial]
fn test_kube_platform_is_rejected() {
    let store = TempDir::new().unwrap();
    let mut suite = setup(&store);

    suite.set_platform("kube").unwrap();
    let err = suite.execute(&InvocationRequest::new(["get", "function"])).unwrap_err();
    assert_eq!(err.message, "platform not supported: kube");
}
