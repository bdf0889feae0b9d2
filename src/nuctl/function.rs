//! Function subcommands of `import`, `get` and `delete`.

use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;

/// Import resources.
#[derive(Subcommand, Debug, Clone)]
pub enum ImportCommand {
    /// Import function configurations.
    ///
    /// Reads one or more `---`-separated YAML documents from `--file`, or
    /// from stdin when no file is given. Each function is stored in the
    /// `imported` state.
    Function {
        /// File to read configurations from
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Namespace for documents that do not name one
        #[arg(short, long)]
        namespace: Option<String>,
    },
}

/// Display resources.
#[derive(Subcommand, Debug, Clone)]
pub enum GetCommand {
    /// Show one function, or all functions in a namespace.
    Function {
        /// Function name; omit to list all
        name: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,

        /// Namespace to look in
        #[arg(short, long)]
        namespace: Option<String>,
    },
}

/// Delete resources.
#[derive(Subcommand, Debug, Clone)]
pub enum DeleteCommand {
    /// Delete a function.
    Function {
        /// Function name
        name: String,

        /// Namespace the function lives in
        #[arg(short, long)]
        namespace: Option<String>,
    },
}

/// How `get` renders functions.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Aligned table.
    #[default]
    Text,
    /// YAML documents.
    Yaml,
    /// JSON.
    Json,
}
