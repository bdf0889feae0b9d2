//! Shell command execution.

use crate::error::{Error, Result};
use crate::traits::{CommandOutput, CommandRunner};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// ETXTBSY error code (errno 26 on Linux).
/// This error occurs when trying to execute a file that is currently being written.
const ETXTBSY: i32 = 26;

/// Shell used when `$SHELL` is unset or unusable.
const FALLBACK_SHELL: &str = "/bin/sh";

/// How often a child with a timeout is polled for exit.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Spawn a command with retry logic for ETXTBSY errors.
///
/// ETXTBSY ("Text file busy") can occur on overlay filesystems (like Docker)
/// when executing a script that was just created. A brief retry usually
/// succeeds.
fn spawn_with_etxtbsy_retry<F>(mut spawn_fn: F) -> std::io::Result<Child>
where
    F: FnMut() -> std::io::Result<Child>,
{
    loop {
        match spawn_fn() {
            Ok(child) => return Ok(child),
            Err(e) if e.raw_os_error() == Some(ETXTBSY) => {
                std::thread::sleep(Duration::from_millis(1));
            }
            Err(e) => return Err(e),
        }
    }
}

/// Drain a child pipe on its own thread so a chatty child never blocks on a
/// full pipe while we poll it.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Command runner backed by real processes and a resolved shell.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: PathBuf,
}

impl ShellRunner {
    /// Create a runner, resolving the shell from `$SHELL` or `/bin/sh`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoShell`] if neither candidate exists.
    pub fn new() -> Result<Self> {
        let mut candidates = Vec::new();
        if let Some(shell) = std::env::var_os("SHELL").filter(|s| !s.is_empty()) {
            candidates.push(PathBuf::from(shell));
        }
        candidates.push(PathBuf::from(FALLBACK_SHELL));

        candidates
            .iter()
            .find(|path| path.is_file())
            .map(|shell| Self { shell: shell.clone() })
            .ok_or_else(|| {
                let tried: Vec<String> =
                    candidates.iter().map(|p| p.display().to_string()).collect();
                Error::NoShell(tried.join(", "))
            })
    }

    /// Create a runner with an explicit shell.
    pub fn with_shell(shell: impl Into<PathBuf>) -> Self {
        Self { shell: shell.into() }
    }

    /// The shell used by [`Self::run_shell`].
    pub fn shell(&self) -> &Path {
        &self.shell
    }

    /// Run a command line through the shell (`<shell> -c <command_line>`).
    ///
    /// # Errors
    ///
    /// Returns an error if the shell cannot be spawned or the command times out.
    pub fn run_shell(&self, command_line: &str, timeout: Option<Duration>) -> Result<CommandOutput> {
        let shell = self.shell.to_string_lossy();
        self.run(&shell, &["-c", command_line], timeout)
    }
}

impl CommandRunner for ShellRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<CommandOutput> {
        tracing::debug!(program, ?args, "Running command");

        let mut command = Command::new(program);
        command.args(args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child = spawn_with_etxtbsy_retry(|| command.spawn())?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match timeout {
            None => child.wait()?,
            Some(limit) => {
                let started = Instant::now();
                loop {
                    if let Some(status) = child.try_wait()? {
                        break status;
                    }
                    if started.elapsed() >= limit {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(Error::CommandTimeout {
                            command: format!("{program} {}", args.join(" ")),
                            timeout_secs: limit.as_secs(),
                        });
                    }
                    std::thread::sleep(WAIT_POLL_INTERVAL);
                }
            }
        };

        let exit_code = status.code().unwrap_or(-1);
        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        Ok(CommandOutput { exit_code, stdout, stderr })
    }
}
