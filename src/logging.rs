//! The suite logger.
//!
//! Each suite owns its own [`Dispatch`] instead of installing a global
//! subscriber, so several suites in one test binary never race over
//! `set_global_default`. The dispatch becomes the thread default only while a
//! suite invocation is running.

use crate::error::{Error, Result};
use tracing::Dispatch;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the suite log filter.
pub const LOG_FILTER_ENV: &str = "NUCTL_TEST_LOG";

/// Filter used when neither the environment nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "debug";

/// A named tracing dispatcher writing through the test harness's capture.
#[derive(Clone)]
pub struct Logger {
    name: String,
    dispatch: Dispatch,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Logger {
    /// Build a logger for tests that writes via libtest's captured stdout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Logger`] if `filter` is not a valid directive list.
    pub fn new_test(name: &str, filter: &str) -> Result<Self> {
        let env_filter = EnvFilter::try_new(filter).map_err(|e| Error::Logger {
            filter: filter.to_string(),
            message: e.to_string(),
        })?;

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_test_writer()
            .with_target(false)
            .finish();

        Ok(Self { name: name.to_string(), dispatch: Dispatch::new(subscriber) })
    }

    /// The logger's name, attached to every event as the `suite` span.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run `f` with this logger as the thread's default dispatcher.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, || {
            let span = tracing::debug_span!("suite", name = %self.name);
            let _entered = span.enter();
            f()
        })
    }
}

/// Resolve the filter directive: `$NUCTL_TEST_LOG`, then `configured`, then
/// [`DEFAULT_LOG_FILTER`].
pub fn resolve_filter(configured: Option<&str>) -> String {
    std::env::var(LOG_FILTER_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| configured.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}
