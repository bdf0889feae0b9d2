//! `nuctl` binary.
//!
//! This binary is a thin wrapper that hands the process's arguments,
//! environment and standard streams to the library's root command.

use std::process::ExitCode;

use nuctl_harness::nuctl::root_command;
use nuctl_harness::traits::RootCommand;
use nuctl_harness::ExecutionContext;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut command = root_command();
    match command.execute(&ExecutionContext::from_process()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(u8::try_from(e.exit_code).unwrap_or(1))
        }
    }
}
