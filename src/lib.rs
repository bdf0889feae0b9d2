//! # `nuctl_harness`
//!
//! In-process integration-test harness for the `nuctl` command-line tool.
//!
//! A [`Suite`] owns the fixtures every test needs, runs `nuctl` command lines
//! against a fresh root command, captures what they print, and polls until a
//! command reaches the expected outcome.

pub mod capture;
pub mod command;
pub mod config;
pub mod dockerclient;
pub mod error;
pub mod functionconfig;
pub mod invocation;
pub mod logging;
#[cfg(feature = "cli")]
pub mod nuctl;
pub mod paths;
pub mod patterns;
pub mod retry;
pub mod suite;
pub mod testing;
pub mod traits;
pub mod version;

pub use error::{Error, InvocationError, Result};
pub use invocation::{ExecutionContext, InvocationRequest};
pub use suite::{Suite, SuiteBuilder};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }
}
