//! Harness configuration.
//!
//! Defaults match what most suites want (poll a minute, every five seconds,
//! against the local platform). A YAML file named by `$NUCTL_TEST_CONFIG` can
//! override them for slower environments, and [`crate::suite::SuiteBuilder`]
//! overrides take precedence over both.

use crate::error::{Error, Result};
use crate::invocation::DEFAULT_PROGRAM_NAME;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable naming a YAML harness config file.
pub const CONFIG_PATH_ENV: &str = "NUCTL_TEST_CONFIG";

/// Default time `execute_and_wait` keeps polling.
pub const DEFAULT_WAIT_DURATION: Duration = Duration::from_secs(60);

/// Default pause between polling attempts.
pub const DEFAULT_WAIT_INTERVAL: Duration = Duration::from_secs(5);

/// Longest wait a config file may ask for.
pub const MAX_WAIT_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Platform selected when `NUCTL_PLATFORM` is unset at suite start.
pub const DEFAULT_PLATFORM: &str = "local";

/// Settings for a [`crate::suite::Suite`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Value placed in `argv[0]`.
    pub program_name: String,

    /// How long `execute_and_wait` polls, in seconds.
    pub wait_duration_secs: u64,

    /// Pause between polling attempts, in seconds.
    pub wait_interval_secs: u64,

    /// Whether command output is also echoed to the test's captured stdout.
    pub echo_output: bool,

    /// Platform to select when `NUCTL_PLATFORM` is unset.
    pub default_platform: String,

    /// Tracing filter directive for the suite logger.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            program_name: DEFAULT_PROGRAM_NAME.to_string(),
            wait_duration_secs: DEFAULT_WAIT_DURATION.as_secs(),
            wait_interval_secs: DEFAULT_WAIT_INTERVAL.as_secs(),
            echo_output: true,
            default_platform: DEFAULT_PLATFORM.to_string(),
            log_filter: None,
        }
    }
}

impl HarnessConfig {
    /// Load the config named by `$NUCTL_TEST_CONFIG`, or the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable names a file that cannot be read or
    /// parsed.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_PATH_ENV).filter(|v| !v.is_empty()) {
            Some(path) => Self::load_from(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    /// Load a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid YAML, or
    /// fails validation.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate(path)?;
        Ok(config)
    }

    /// Save the config as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Default polling duration.
    pub const fn wait_duration(&self) -> Duration {
        Duration::from_secs(self.wait_duration_secs)
    }

    /// Default polling interval.
    pub const fn wait_interval(&self) -> Duration {
        Duration::from_secs(self.wait_interval_secs)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let invalid = |message: &str| Error::Config {
            path: path.to_path_buf(),
            message: message.to_string(),
        };

        if self.program_name.trim().is_empty() {
            return Err(invalid("program_name must not be empty"));
        }
        if self.wait_interval_secs == 0 {
            return Err(invalid("wait_interval_secs must be at least 1"));
        }
        if self.wait_duration_secs > MAX_WAIT_DURATION.as_secs()
            || self.wait_interval_secs > MAX_WAIT_DURATION.as_secs()
        {
            return Err(invalid("wait durations must not exceed one day"));
        }
        if self.default_platform.trim().is_empty() {
            return Err(invalid("default_platform must not be empty"));
        }
        Ok(())
    }
}
