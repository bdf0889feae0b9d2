//! Container runtime client that drives the `docker` CLI through a
//! [`CommandRunner`].

use crate::error::{Error, Result};
use crate::traits::{CommandOutput, CommandRunner, ContainerClient};
use std::rc::Rc;
use std::time::Duration;

/// Timeout applied to every docker invocation.
const DOCKER_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Container client that shells out to `docker`.
pub struct ShellContainerClient {
    runner: Rc<dyn CommandRunner>,
    program: String,
}

impl std::fmt::Debug for ShellContainerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellContainerClient").field("program", &self.program).finish()
    }
}

impl ShellContainerClient {
    /// Create a client, verifying that `docker version` succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContainerRuntime`] if the docker CLI is missing or
    /// cannot reach its daemon.
    pub fn new(runner: Rc<dyn CommandRunner>) -> Result<Self> {
        let client = Self { runner, program: "docker".to_string() };
        let version = client.version().map_err(|e| {
            Error::ContainerRuntime(format!("No docker client found: {e}"))
        })?;
        tracing::debug!(%version, "Docker client created");
        Ok(client)
    }

    fn docker(&self, args: &[&str]) -> Result<CommandOutput> {
        let output = self.runner.run(&self.program, args, Some(DOCKER_COMMAND_TIMEOUT))?;
        if output.success() {
            Ok(output)
        } else {
            Err(Error::CommandFailed {
                command: format!("{} {}", self.program, args.join(" ")),
                exit_code: output.exit_code,
                stderr: output.stderr,
            })
        }
    }
}

impl ContainerClient for ShellContainerClient {
    fn version(&self) -> Result<String> {
        let output = self.docker(&["version", "--format", "{{.Server.Version}}"])?;
        Ok(output.stdout.trim().to_string())
    }

    fn image_exists(&self, image: &str) -> Result<bool> {
        let output = self.docker(&["images", "--quiet", image])?;
        Ok(!output.stdout.trim().is_empty())
    }

    fn remove_image(&self, image: &str) -> Result<()> {
        self.docker(&["rmi", "--force", image])?;
        Ok(())
    }

    fn container_logs(&self, container: &str) -> Result<String> {
        Ok(self.docker(&["logs", container])?.combined_output())
    }
}
