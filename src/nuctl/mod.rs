//! A small `nuctl` root command backed by a local function store.
//!
//! The harness drives this command in its own tests, and the `nuctl` binary
//! wraps it for manual use. It understands the subset of `nuctl` that suites
//! lean on most: deploying, importing, listing and deleting functions.

mod function;
mod platform;
mod run;

#[cfg(test)]
mod tests;

pub use function::{DeleteCommand, GetCommand, ImportCommand, OutputFormat};
pub use platform::{Function, LocalPlatform, Platform, PlatformKind, LOCAL_STORE_ENV};
pub use run::{root_command, NuctlCommand};

use clap::{Parser, Subcommand};

/// nuctl - Nuclio command-line interface.
///
/// Deploys, imports and inspects serverless functions on a platform selected
/// with `--platform` or `$NUCTL_PLATFORM`.
#[derive(Parser, Debug)]
#[command(name = "nuctl")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Platform to operate on (local, kube). Defaults to $NUCTL_PLATFORM, then local.
    #[arg(long, global = true)]
    pub platform: Option<String>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show version information.
    Version,

    /// Build and deploy a function.
    ///
    /// The configuration comes from `--file` if given, with any flags
    /// applied on top. The function is stored in the `ready` state.
    Deploy {
        /// Function name
        name: String,

        /// Function configuration file
        #[arg(short, long)]
        file: Option<std::path::PathBuf>,

        /// Runtime, e.g. python:3.9
        #[arg(long)]
        runtime: Option<String>,

        /// Handler, e.g. main:handler
        #[arg(long)]
        handler: Option<String>,

        /// Fixed number of replicas
        #[arg(long)]
        replicas: Option<u32>,

        /// Namespace to deploy into
        #[arg(short, long)]
        namespace: Option<String>,
    },

    /// Import resources without deploying them.
    #[command(subcommand)]
    Import(ImportCommand),

    /// Display resource information.
    #[command(subcommand)]
    Get(GetCommand),

    /// Delete resources.
    #[command(subcommand)]
    Delete(DeleteCommand),
}
