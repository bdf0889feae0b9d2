//! Error types for `nuctl_harness`.

use std::path::PathBuf;
use std::time::Duration;

/// Errors that can occur while driving `nuctl` from a test.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON encoding error occurred.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error occurred.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A command execution failed.
    #[error("Command '{command}' failed with exit code {exit_code}: {stderr}")]
    CommandFailed {
        /// The command that was run.
        command: String,
        /// The exit code.
        exit_code: i32,
        /// The stderr output.
        stderr: String,
    },

    /// A command timed out.
    #[error("Command '{command}' timed out after {timeout_secs} seconds")]
    CommandTimeout {
        /// The command that was run.
        command: String,
        /// The timeout in seconds.
        timeout_secs: u64,
    },

    /// No usable shell was found for the shell runner.
    #[error("No executable shell found (tried {0})")]
    NoShell(String),

    /// The container runtime is missing or misbehaving.
    #[error("Container runtime error: {0}")]
    ContainerRuntime(String),

    /// The suite logger could not be built.
    #[error("Invalid log filter '{filter}': {message}")]
    Logger {
        /// The rejected filter directive.
        filter: String,
        /// The parser's complaint.
        message: String,
    },

    /// A harness configuration file was invalid.
    #[error("Invalid harness config {path}: {message}")]
    Config {
        /// The config file.
        path: PathBuf,
        /// What was wrong with it.
        message: String,
    },

    /// One of the suite fixtures could not be constructed.
    #[error("Suite setup failed while creating the {stage}: {source}")]
    Setup {
        /// The fixture that failed.
        stage: SetupStage,
        /// The underlying error.
        #[source]
        source: Box<Self>,
    },

    /// An environment variable could not be written or restored.
    #[error("Failed to write environment variable {name}: {message}")]
    Environment {
        /// The variable name.
        name: String,
        /// Why the write was rejected.
        message: String,
    },

    /// A `nuctl` invocation failed.
    #[error(transparent)]
    Invocation(#[from] InvocationError),

    /// The retry poller gave up.
    #[error("{source}{}", .last_error.as_ref().map(|e| format!(" (last error: {e})")).unwrap_or_default())]
    Timeout {
        /// The deadline that elapsed.
        #[source]
        source: TimedOut,
        /// The error from the final attempt, if it failed.
        last_error: Option<String>,
    },

    /// Captured output did not satisfy the pattern expectations.
    #[error(transparent)]
    PatternMismatch(#[from] PatternMismatch),

    /// A decoded function configuration carried the wrong name.
    #[error("Expected function '{expected}', got '{actual}'")]
    NameMismatch {
        /// The name that was asked for.
        expected: String,
        /// The name that came back.
        actual: String,
    },

    /// A function does not exist on the platform.
    #[error("function not found: {0}")]
    FunctionNotFound(String),

    /// The selected platform cannot be used.
    #[error("platform not supported: {0}")]
    UnsupportedPlatform(String),
}

/// The suite fixtures, in construction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStage {
    /// The suite logger.
    Logger,
    /// The shell command runner.
    ShellRunner,
    /// The container runtime client.
    ContainerClient,
}

impl std::fmt::Display for SetupStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Logger => "logger",
            Self::ShellRunner => "shell runner",
            Self::ContainerClient => "container client",
        };
        f.write_str(name)
    }
}

/// A failed `nuctl` invocation.
///
/// The message is whatever the dispatcher reported; the harness does not
/// classify it further.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct InvocationError {
    /// Human-readable failure text.
    pub message: String,
    /// Exit code a real process would have exited with.
    pub exit_code: i32,
}

impl InvocationError {
    /// Create an invocation error with exit code 1.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), exit_code: 1 }
    }

    /// Override the exit code.
    #[must_use]
    pub const fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = exit_code;
        self
    }
}

impl From<Error> for InvocationError {
    fn from(err: Error) -> Self {
        match err {
            Error::Invocation(inner) => inner,
            other => Self::new(other.to_string()),
        }
    }
}

/// The retry poller's deadline elapsed before the expectation held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Timed out after {}ms waiting until successful ({attempts} attempts)", .duration.as_millis())]
pub struct TimedOut {
    /// The configured wait duration.
    pub duration: Duration,
    /// How many times the check ran.
    pub attempts: u32,
}

/// Required patterns that were missing or forbidden patterns that were found.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing required patterns {missing:?}, found forbidden patterns {forbidden:?}")]
pub struct PatternMismatch {
    /// Required patterns absent from every line.
    pub missing: Vec<String>,
    /// Forbidden patterns present in at least one line.
    pub forbidden: Vec<String>,
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
