//! Suite lifecycle and the invocation helpers tests call.
//!
//! A [`Suite`] is built once per test file (the "setup suite" step), reset
//! before every test with [`Suite::setup_test`], and torn down with
//! [`Suite::teardown_suite`]. In between, tests drive the CLI with
//! [`Suite::execute`] or [`Suite::execute_and_wait`] and assert on
//! [`Suite::output`].
//!
//! The suite mutates the process-wide `NUCTL_PLATFORM` variable, so suites
//! that touch it must not run concurrently with each other.

use crate::capture::{CaptureBuffer, InputBuffer, TeeWriter};
use crate::command::ShellRunner;
use crate::config::HarnessConfig;
use crate::dockerclient::ShellContainerClient;
use crate::error::{Error, InvocationError, Result, SetupStage};
use crate::functionconfig::Config;
use crate::invocation::{ExecutionContext, InvocationRequest};
use crate::logging::{resolve_filter, Logger};
use crate::patterns::{find_patterns, PatternReport};
use crate::paths;
use crate::retry::retry_until_successful;
use crate::traits::{Clock, CommandRunner, ContainerClient, RootCommand, SystemClock};
use crate::version::VersionInfo;
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;
use tracing_subscriber::fmt::TestWriter;

/// Environment variable that selects the platform `nuctl` targets.
pub const PLATFORM_ENV: &str = "NUCTL_PLATFORM";

type RootCommandFactory = Box<dyn Fn() -> Box<dyn RootCommand>>;
type LoggerFactory = Box<dyn FnOnce() -> Result<Logger>>;
type ShellRunnerFactory = Box<dyn FnOnce() -> Result<Rc<dyn CommandRunner>>>;
type ContainerClientFactory =
    Box<dyn FnOnce(Rc<dyn CommandRunner>) -> Result<Box<dyn ContainerClient>>>;

/// Builds a [`Suite`]. Anything not set explicitly falls back to the real
/// implementation.
pub struct SuiteBuilder {
    factory: RootCommandFactory,
    config: Option<HarnessConfig>,
    logger: Option<LoggerFactory>,
    shell_runner: Option<ShellRunnerFactory>,
    container_client: Option<ContainerClientFactory>,
    clock: Option<Rc<dyn Clock>>,
    wait: Option<(Duration, Duration)>,
    echo_output: Option<bool>,
}

impl std::fmt::Debug for SuiteBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiteBuilder")
            .field("config", &self.config)
            .field("wait", &self.wait)
            .field("echo_output", &self.echo_output)
            .finish_non_exhaustive()
    }
}

impl SuiteBuilder {
    /// Start a builder around the CLI's root-command constructor.
    pub fn new(factory: impl Fn() -> Box<dyn RootCommand> + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            config: None,
            logger: None,
            shell_runner: None,
            container_client: None,
            clock: None,
            wait: None,
            echo_output: None,
        }
    }

    /// Use this config instead of the one named by `$NUCTL_TEST_CONFIG`.
    #[must_use]
    pub fn config(mut self, config: HarnessConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Construct the logger with `factory`.
    #[must_use]
    pub fn logger(mut self, factory: impl FnOnce() -> Result<Logger> + 'static) -> Self {
        self.logger = Some(Box::new(factory));
        self
    }

    /// Construct the shell runner with `factory`.
    #[must_use]
    pub fn shell_runner(
        mut self,
        factory: impl FnOnce() -> Result<Rc<dyn CommandRunner>> + 'static,
    ) -> Self {
        self.shell_runner = Some(Box::new(factory));
        self
    }

    /// Construct the container client from the shell runner with `factory`.
    #[must_use]
    pub fn container_client(
        mut self,
        factory: impl FnOnce(Rc<dyn CommandRunner>) -> Result<Box<dyn ContainerClient>> + 'static,
    ) -> Self {
        self.container_client = Some(Box::new(factory));
        self
    }

    /// Read time from `clock` when polling.
    #[must_use]
    pub fn clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Override the default wait duration and interval.
    #[must_use]
    pub const fn wait(mut self, duration: Duration, interval: Duration) -> Self {
        self.wait = Some((duration, interval));
        self
    }

    /// Override whether output is echoed to the test's stdout.
    #[must_use]
    pub const fn echo_output(mut self, echo: bool) -> Self {
        self.echo_output = Some(echo);
        self
    }

    /// Set up the suite.
    ///
    /// Creates the logger, the shell runner and the container client, in that
    /// order, stopping at the first failure. Then records the current
    /// `NUCTL_PLATFORM` and defaults it to the configured platform if it is
    /// unset or empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Setup`] naming the fixture that failed, or an error
    /// if the config cannot be loaded or the environment cannot be written.
    pub fn build(self) -> Result<Suite> {
        let config = match self.config {
            Some(config) => config,
            None => HarnessConfig::from_env()?,
        };

        let logger = match self.logger {
            Some(factory) => factory(),
            None => Logger::new_test("test", &resolve_filter(config.log_filter.as_deref())),
        }
        .map_err(|e| setup_error(SetupStage::Logger, e))?;

        let shell_runner = match self.shell_runner {
            Some(factory) => factory(),
            None => ShellRunner::new().map(|runner| Rc::new(runner) as Rc<dyn CommandRunner>),
        }
        .map_err(|e| setup_error(SetupStage::ShellRunner, e))?;

        let container_client = logger
            .in_scope(|| match self.container_client {
                Some(factory) => factory(Rc::clone(&shell_runner)),
                None => ShellContainerClient::new(Rc::clone(&shell_runner))
                    .map(|client| Box::new(client) as Box<dyn ContainerClient>),
            })
            .map_err(|e| setup_error(SetupStage::ContainerClient, e))?;

        let orig_platform = std::env::var_os(PLATFORM_ENV);
        if orig_platform.as_deref().map_or(true, OsStr::is_empty) {
            write_env(PLATFORM_ENV, Some(OsStr::new(&config.default_platform)))?;
        }

        let (default_wait_duration, default_wait_interval) =
            self.wait.unwrap_or((config.wait_duration(), config.wait_interval()));

        let suite = Suite {
            orig_platform,
            logger,
            shell_runner,
            container_client,
            factory: self.factory,
            output: CaptureBuffer::new(),
            input: InputBuffer::new(),
            default_wait_duration,
            default_wait_interval,
            clock: self.clock.unwrap_or_else(|| Rc::new(SystemClock)),
            program_name: config.program_name,
            echo_output: self.echo_output.unwrap_or(config.echo_output),
            env_overrides: BTreeMap::new(),
            last_args: None,
            version: VersionInfo::from_env(&process_env()),
            restored: false,
        };

        suite.logger.in_scope(|| {
            tracing::debug!(
                platform = ?std::env::var_os(PLATFORM_ENV),
                wait_duration = ?suite.default_wait_duration,
                wait_interval = ?suite.default_wait_interval,
                "Suite set up"
            );
        });

        Ok(suite)
    }
}

fn setup_error(stage: SetupStage, source: Error) -> Error {
    Error::Setup { stage, source: Box::new(source) }
}

/// The process environment, minus variables that are not valid UTF-8.
fn process_env() -> BTreeMap<String, String> {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

/// Write or remove an environment variable, rejecting values the platform
/// cannot store instead of panicking.
fn write_env(name: &str, value: Option<&OsStr>) -> Result<()> {
    let invalid = |message: &str| Error::Environment {
        name: name.to_string(),
        message: message.to_string(),
    };

    if name.is_empty() || name.contains(['=', '\0']) {
        return Err(invalid("invalid variable name"));
    }
    match value {
        Some(value) if value.as_encoded_bytes().contains(&0) => {
            Err(invalid("value contains a NUL byte"))
        }
        Some(value) => {
            std::env::set_var(name, value);
            Ok(())
        }
        None => {
            std::env::remove_var(name);
            Ok(())
        }
    }
}

/// Shared state for one suite run.
pub struct Suite {
    orig_platform: Option<OsString>,
    logger: Logger,
    shell_runner: Rc<dyn CommandRunner>,
    container_client: Box<dyn ContainerClient>,
    factory: RootCommandFactory,
    output: CaptureBuffer,
    input: InputBuffer,
    default_wait_duration: Duration,
    default_wait_interval: Duration,
    clock: Rc<dyn Clock>,
    program_name: String,
    echo_output: bool,
    env_overrides: BTreeMap<String, Option<String>>,
    last_args: Option<Vec<String>>,
    version: VersionInfo,
    restored: bool,
}

impl std::fmt::Debug for Suite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Suite")
            .field("orig_platform", &self.orig_platform)
            .field("logger", &self.logger)
            .field("program_name", &self.program_name)
            .field("default_wait_duration", &self.default_wait_duration)
            .field("default_wait_interval", &self.default_wait_interval)
            .field("last_args", &self.last_args)
            .finish_non_exhaustive()
    }
}

impl Suite {
    /// Set up a suite with the real logger, shell runner and container client.
    ///
    /// # Errors
    ///
    /// See [`SuiteBuilder::build`].
    pub fn setup(factory: impl Fn() -> Box<dyn RootCommand> + 'static) -> Result<Self> {
        SuiteBuilder::new(factory).build()
    }

    /// Start a [`SuiteBuilder`].
    pub fn builder(factory: impl Fn() -> Box<dyn RootCommand> + 'static) -> SuiteBuilder {
        SuiteBuilder::new(factory)
    }

    /// Per-test reset: clears both buffers.
    pub fn setup_test(&self) {
        self.output.reset();
        self.input.reset();
    }

    /// Restore `NUCTL_PLATFORM` to its value before the suite, removing it if
    /// it was unset. Calling this more than once is harmless.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Environment`] if the variable cannot be written.
    pub fn teardown_suite(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        write_env(PLATFORM_ENV, self.orig_platform.as_deref())?;
        self.restored = true;
        Ok(())
    }

    /// Run the CLI once, as if launched from a shell.
    ///
    /// A fresh root command is built, its output is sent to both the test's
    /// captured stdout and the output buffer, its input is read from the input buffer, and it runs
    /// `[program] + positional + --name value...` synchronously.
    ///
    /// # Errors
    ///
    /// Returns whatever error the CLI reported.
    pub fn execute(&mut self, request: &InvocationRequest) -> std::result::Result<(), InvocationError> {
        let mut command = (self.factory)();

        if self.echo_output {
            command.set_output(Box::new(TeeWriter::new(TestWriter::new(), self.output.clone())));
        } else {
            command.set_output(Box::new(self.output.clone()));
        }
        command.set_input(Box::new(self.input.clone()));

        let args = request.to_argv(&self.program_name);
        let ctx = ExecutionContext::new(args.clone(), self.environment());
        self.last_args = Some(args);

        self.logger.in_scope(|| {
            tracing::debug!(args = ?ctx.args, "Executing nuctl");
            command.execute(&ctx)
        })
    }

    /// [`Self::execute`] until it succeeds (or, with `expect_failure`, until
    /// it fails), using the default wait duration and interval.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the expected outcome never happened.
    pub fn execute_and_wait(&mut self, request: &InvocationRequest, expect_failure: bool) -> Result<()> {
        let (duration, interval) = (self.default_wait_duration, self.default_wait_interval);
        self.execute_and_wait_with(request, expect_failure, duration, interval)
    }

    /// [`Self::execute_and_wait`] with an explicit duration and interval.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the expected outcome never happened.
    pub fn execute_and_wait_with(
        &mut self,
        request: &InvocationRequest,
        expect_failure: bool,
        duration: Duration,
        interval: Duration,
    ) -> Result<()> {
        let clock = Rc::clone(&self.clock);
        let mut last_error = None;

        let result = retry_until_successful(clock.as_ref(), duration, interval, || {
            let outcome = self.execute(request);
            let succeeded = outcome.is_ok();
            last_error = outcome.err().map(|e| e.message);
            succeeded != expect_failure
        });

        match result {
            Ok(attempts) => {
                self.logger.in_scope(|| tracing::debug!(attempts, expect_failure, "Wait satisfied"));
                Ok(())
            }
            Err(source) => Err(Error::Timeout { source, last_error }),
        }
    }

    /// Scan the output buffer for required and forbidden patterns.
    pub fn find_patterns_in_output<S: AsRef<str>>(
        &self,
        must_exist: &[S],
        must_not_exist: &[S],
    ) -> PatternReport {
        find_patterns(&self.output.bytes(), must_exist, must_not_exist)
    }

    /// Fail the current test unless every `must_exist` pattern and no
    /// `must_not_exist` pattern appears in the output buffer.
    ///
    /// # Panics
    ///
    /// Panics with the offending patterns when the expectation does not hold.
    #[track_caller]
    pub fn assert_patterns_in_output<S: AsRef<str>>(&self, must_exist: &[S], must_not_exist: &[S]) {
        crate::patterns::assert_patterns(&self.output.bytes(), must_exist, must_not_exist);
    }

    /// Check that `nuctl get function <name>` reports the function, and, if
    /// `imported`, that it shows as imported.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the query never succeeds, a YAML error if
    /// its output is not a function config, [`Error::NameMismatch`] if it
    /// names another function, and [`Error::PatternMismatch`] if the function
    /// is not shown as imported.
    pub fn try_assert_function_imported(&mut self, name: &str, imported: bool) -> Result<()> {
        self.output.reset();
        let query = InvocationRequest::new(["get", "function", name]);
        self.execute_and_wait(&query.clone().flag("output", "yaml"), false)?;

        let function: Config = serde_yaml::from_slice(&self.output.bytes())?;
        if function.meta.name != name {
            return Err(Error::NameMismatch {
                expected: name.to_string(),
                actual: function.meta.name,
            });
        }

        if imported {
            self.output.reset();
            self.execute(&query)?;
            self.find_patterns_in_output(&["imported"], &[]).check()?;
        }
        Ok(())
    }

    /// Panicking form of [`Self::try_assert_function_imported`].
    ///
    /// # Panics
    ///
    /// Panics if the function is missing, misnamed, or not imported when it
    /// should be.
    #[track_caller]
    pub fn assert_function_imported(&mut self, name: &str, imported: bool) {
        if let Err(e) = self.try_assert_function_imported(name, imported) {
            panic!("function '{name}' check failed: {e}\n--- output ---\n{}", self.output.to_string_lossy());
        }
    }

    /// Set an environment variable for subsequent invocations only.
    pub fn set_env(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.env_overrides.insert(name.into(), Some(value.into()));
    }

    /// Hide an environment variable from subsequent invocations.
    pub fn remove_env(&mut self, name: impl Into<String>) {
        self.env_overrides.insert(name.into(), None);
    }

    /// Change the process-wide `NUCTL_PLATFORM`. Restored at teardown.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Environment`] if the value cannot be written.
    pub fn set_platform(&self, platform: &str) -> Result<()> {
        write_env(PLATFORM_ENV, Some(OsStr::new(platform)))
    }

    /// The environment an invocation sees: the process environment with the
    /// suite's overrides applied. Variables that are not valid UTF-8 are left
    /// out.
    pub fn environment(&self) -> BTreeMap<String, String> {
        let mut env = process_env();
        for (name, value) in &self.env_overrides {
            match value {
                Some(value) => env.insert(name.clone(), value.clone()),
                None => env.remove(name),
            };
        }
        env
    }

    /// Everything the CLI printed since the last reset.
    pub const fn output(&self) -> &CaptureBuffer {
        &self.output
    }

    /// Stdin for the next invocations.
    pub const fn input(&self) -> &InputBuffer {
        &self.input
    }

    /// Clear the output buffer mid-test.
    pub fn reset_output(&self) {
        self.output.reset();
    }

    /// Queue stdin for the next invocations.
    pub fn write_input(&self, data: impl AsRef<[u8]>) {
        self.input.push(data);
    }

    /// Argument vector of the most recent invocation.
    pub fn last_args(&self) -> Option<&[String]> {
        self.last_args.as_deref()
    }

    /// Value of `NUCTL_PLATFORM` before the suite started.
    pub fn original_platform(&self) -> Option<&OsStr> {
        self.orig_platform.as_deref()
    }

    /// The suite logger.
    pub const fn logger(&self) -> &Logger {
        &self.logger
    }

    /// The shell runner.
    pub fn shell_runner(&self) -> &dyn CommandRunner {
        self.shell_runner.as_ref()
    }

    /// The container client.
    pub fn container_client(&self) -> &dyn ContainerClient {
        self.container_client.as_ref()
    }

    /// How long `execute_and_wait` polls.
    pub const fn default_wait_duration(&self) -> Duration {
        self.default_wait_duration
    }

    /// Pause between `execute_and_wait` attempts.
    pub const fn default_wait_interval(&self) -> Duration {
        self.default_wait_interval
    }

    /// Version information read at setup.
    pub const fn version_info(&self) -> &VersionInfo {
        &self.version
    }

    /// See [`paths::source_dir`].
    pub fn source_dir(&self) -> PathBuf {
        paths::source_dir()
    }

    /// See [`paths::functions_dir`].
    pub fn functions_dir(&self) -> PathBuf {
        paths::functions_dir()
    }

    /// See [`paths::function_configs_dir`].
    pub fn function_configs_dir(&self) -> PathBuf {
        paths::function_configs_dir()
    }

    /// See [`paths::imports_dir`].
    pub fn imports_dir(&self) -> PathBuf {
        paths::imports_dir()
    }
}

impl Drop for Suite {
    fn drop(&mut self) {
        if let Err(e) = self.teardown_suite() {
            self.logger.in_scope(|| tracing::warn!(error = %e, "Failed to restore {PLATFORM_ENV}"));
        }
    }
}
