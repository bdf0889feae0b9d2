//! Command execution for `nuctl`.

use super::function::{DeleteCommand, GetCommand, ImportCommand, OutputFormat};
use super::platform::{Function, Platform, PlatformKind};
use super::{Cli, Command};
use crate::config::DEFAULT_PLATFORM;
use crate::error::{Error, InvocationError, Result};
use crate::functionconfig::{Config, FunctionState, DEFAULT_NAMESPACE};
use crate::invocation::ExecutionContext;
use crate::suite::PLATFORM_ENV;
use crate::traits::RootCommand;
use crate::version::VersionInfo;
use clap::error::ErrorKind;
use clap::Parser;
use std::io::{self, Read, Write};
use std::path::PathBuf;

/// Build a `nuctl` root command wired to the process's stdout and stdin.
#[must_use]
pub fn root_command() -> Box<dyn RootCommand> {
    Box::new(NuctlCommand::new())
}

/// The `nuctl` root command.
pub struct NuctlCommand {
    output: Box<dyn Write>,
    input: Box<dyn Read>,
}

impl std::fmt::Debug for NuctlCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NuctlCommand").finish_non_exhaustive()
    }
}

impl Default for NuctlCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl NuctlCommand {
    /// Create a command writing to stdout and reading stdin.
    #[must_use]
    pub fn new() -> Self {
        Self { output: Box::new(io::stdout()), input: Box::new(io::stdin()) }
    }
}

impl RootCommand for NuctlCommand {
    fn set_output(&mut self, output: Box<dyn Write>) {
        self.output = output;
    }

    fn set_input(&mut self, input: Box<dyn Read>) {
        self.input = input;
    }

    fn execute(&mut self, ctx: &ExecutionContext) -> std::result::Result<(), InvocationError> {
        let cli = match Cli::try_parse_from(&ctx.args) {
            Ok(cli) => cli,
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                write!(self.output, "{}", e.render()).map_err(Error::from)?;
                return Ok(());
            }
            Err(e) => {
                return Err(InvocationError::new(e.render().to_string().trim_end())
                    .with_exit_code(e.exit_code()));
            }
        };

        let platform = cli
            .platform
            .or_else(|| ctx.var(PLATFORM_ENV).map(str::to_string))
            .unwrap_or_else(|| DEFAULT_PLATFORM.to_string());
        tracing::debug!(%platform, command = ?cli.command, "Running nuctl command");

        self.run(cli.command, &platform, ctx).map_err(InvocationError::from)
    }
}

impl NuctlCommand {
    fn run(&mut self, command: Command, platform: &str, ctx: &ExecutionContext) -> Result<()> {
        let open_platform =
            || -> Result<Box<dyn Platform>> { platform.parse::<PlatformKind>()?.open(ctx) };

        match command {
            Command::Version => {
                writeln!(self.output, "{}", VersionInfo::from_env(&ctx.env))?;
                Ok(())
            }
            Command::Deploy { name, file, runtime, handler, replicas, namespace } => {
                let mut config = match file {
                    Some(path) => Config::from_yaml(&std::fs::read_to_string(path)?)?,
                    None => Config::default(),
                };
                config.meta.name = name;
                if let Some(runtime) = runtime {
                    config.spec.runtime = runtime;
                }
                if let Some(handler) = handler {
                    config.spec.handler = handler;
                }
                if replicas.is_some() {
                    config.spec.replicas = replicas;
                }
                let platform = open_platform()?;
                self.store(platform.as_ref(), config, namespace, FunctionState::Ready)
            }
            Command::Import(ImportCommand::Function { file, namespace }) => {
                let platform = open_platform()?;
                self.import(platform.as_ref(), file, namespace)
            }
            Command::Get(GetCommand::Function { name, output, namespace }) => {
                let namespace = namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE);
                let functions = open_platform()?.get_functions(namespace, name.as_deref())?;
                self.render(&functions, output, name.is_some())
            }
            Command::Delete(DeleteCommand::Function { name, namespace }) => {
                let namespace = namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE);
                open_platform()?.delete_function(namespace, &name)?;
                writeln!(self.output, "Function '{name}' deleted")?;
                Ok(())
            }
        }
    }

    fn store(
        &mut self,
        platform: &dyn Platform,
        mut config: Config,
        namespace: Option<String>,
        state: FunctionState,
    ) -> Result<()> {
        config.meta.namespace = namespace.unwrap_or_else(|| config.namespace().to_string());
        let function = Function::new(config, state);
        platform.create_function(&function)?;

        let verb = match state {
            FunctionState::Imported => "imported",
            FunctionState::Ready | FunctionState::Error => "deployed",
        };
        writeln!(self.output, "Function '{}' {verb}", function.meta.name)?;
        Ok(())
    }

    fn import(
        &mut self,
        platform: &dyn Platform,
        file: Option<PathBuf>,
        namespace: Option<String>,
    ) -> Result<()> {
        let yaml = match file {
            Some(path) => std::fs::read_to_string(path)?,
            None => {
                let mut yaml = String::new();
                self.input.read_to_string(&mut yaml)?;
                yaml
            }
        };

        let configs = Config::from_yaml_documents(&yaml)?;
        if configs.is_empty() {
            return Err(InvocationError::new("no function configurations to import").into());
        }
        for config in configs {
            self.store(platform, config, namespace.clone(), FunctionState::Imported)?;
        }
        Ok(())
    }

    fn render(&mut self, functions: &[Function], format: OutputFormat, single: bool) -> Result<()> {
        match (format, functions) {
            (OutputFormat::Text, _) => {
                let rows: Vec<[String; 4]> = functions
                    .iter()
                    .map(|f| {
                        [
                            f.meta.namespace.clone(),
                            f.meta.name.clone(),
                            f.status.state.as_str().to_string(),
                            f.spec.replicas.unwrap_or(1).to_string(),
                        ]
                    })
                    .collect();
                self.output.write_all(render_table(&rows).as_bytes())?;
            }
            (OutputFormat::Yaml, [function]) if single => {
                self.output.write_all(serde_yaml::to_string(function)?.as_bytes())?;
            }
            (OutputFormat::Yaml, _) => {
                let documents = functions
                    .iter()
                    .map(serde_yaml::to_string)
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                self.output.write_all(documents.join("---\n").as_bytes())?;
            }
            (OutputFormat::Json, [function]) if single => {
                writeln!(self.output, "{}", serde_json::to_string_pretty(function)?)?;
            }
            (OutputFormat::Json, _) => {
                writeln!(self.output, "{}", serde_json::to_string_pretty(functions)?)?;
            }
        }
        Ok(())
    }
}

const TABLE_HEADER: [&str; 4] = ["NAMESPACE", "NAME", "STATE", "REPLICAS"];

/// Left-aligned columns separated by two spaces.
fn render_table(rows: &[[String; 4]]) -> String {
    let mut widths = TABLE_HEADER.map(str::len);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut table = String::new();
    let header = TABLE_HEADER.map(str::to_string);
    for row in std::iter::once(&header).chain(rows) {
        let cells: Vec<String> =
            row.iter().zip(widths).map(|(cell, width)| format!("{cell:<width$}")).collect();
        table.push_str(cells.join("  ").trim_end());
        table.push('\n');
    }
    table
}
