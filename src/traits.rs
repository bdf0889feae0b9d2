//! Core traits for testability and abstraction.
//!
//! Every collaborator the suite touches sits behind one of these traits so
//! the harness can be exercised with the doubles in [`crate::testing`].

use crate::error::{InvocationError, Result};
use crate::invocation::ExecutionContext;
use std::io::{Read, Write};
use std::time::{Duration, Instant};

/// Output from a command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// The exit code of the command.
    pub exit_code: i32,
    /// The stdout output.
    pub stdout: String,
    /// The stderr output.
    pub stderr: String,
}

impl CommandOutput {
    /// Check if the command succeeded (exit code 0).
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Get combined stdout and stderr.
    #[must_use]
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Trait for running shell commands.
///
/// This trait abstracts command execution for testability.
pub trait CommandRunner {
    /// Run a command with the given arguments and timeout.
    ///
    /// # Arguments
    ///
    /// * `program` - The program to run.
    /// * `args` - The arguments to pass.
    /// * `timeout` - Optional timeout duration.
    ///
    /// # Returns
    ///
    /// The command output, or an error if the command could not be started.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned, or if it outlives
    /// `timeout`.
    fn run(&self, program: &str, args: &[&str], timeout: Option<Duration>)
        -> Result<CommandOutput>;
}

/// Client for the container runtime that deployed functions run under.
pub trait ContainerClient {
    /// The runtime's server version.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be reached.
    fn version(&self) -> Result<String>;

    /// Whether an image with this reference exists locally.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be reached.
    fn image_exists(&self, image: &str) -> Result<bool>;

    /// Remove a local image.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime rejects the removal.
    fn remove_image(&self, image: &str) -> Result<()>;

    /// Combined logs of a container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container does not exist.
    fn container_logs(&self, container: &str) -> Result<String>;
}

/// The CLI dispatcher a suite drives.
///
/// A fresh instance is built for every invocation, wired to the suite's
/// buffers, executed once and dropped.
pub trait RootCommand {
    /// Redirect everything the command prints.
    fn set_output(&mut self, output: Box<dyn Write>);

    /// Redirect what the command reads as stdin.
    fn set_input(&mut self, input: Box<dyn Read>);

    /// Dispatch the command line in `ctx` synchronously.
    ///
    /// # Errors
    ///
    /// Returns the reason the invocation failed.
    fn execute(&mut self, ctx: &ExecutionContext) -> std::result::Result<(), InvocationError>;
}

/// Source of time for the retry poller.
pub trait Clock {
    /// The current instant.
    fn now(&self) -> Instant;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// The wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
