//! Command lines handed to a root command.
//!
//! Instead of overwriting the process's argument list, the harness builds an
//! [`ExecutionContext`] per call and passes it straight into
//! [`RootCommand::execute`](crate::traits::RootCommand::execute).

use std::collections::BTreeMap;

/// Placeholder for `argv[0]`.
pub const DEFAULT_PROGRAM_NAME: &str = "nuctl";

/// Positional arguments plus `--name value` flags.
///
/// Positional order is preserved. Flags are kept sorted by name; a repeated
/// flag keeps its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationRequest {
    positional: Vec<String>,
    named: BTreeMap<String, String>,
}

impl InvocationRequest {
    /// Start a request from positional arguments.
    pub fn new<I, S>(positional: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { positional: positional.into_iter().map(Into::into).collect(), named: BTreeMap::new() }
    }

    /// Add a named argument, rendered as `--name value`.
    #[must_use]
    pub fn flag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    /// Add several named arguments.
    #[must_use]
    pub fn flags<I, K, V>(mut self, named: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.named.extend(named.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// The positional arguments, in order.
    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    /// The named arguments.
    pub const fn named(&self) -> &BTreeMap<String, String> {
        &self.named
    }

    /// Render the full argument vector:
    /// `[program] + positional + [--name, value]...`.
    pub fn to_argv(&self, program: &str) -> Vec<String> {
        let mut argv = Vec::with_capacity(1 + self.positional.len() + 2 * self.named.len());
        argv.push(program.to_string());
        argv.extend(self.positional.iter().cloned());
        for (name, value) in &self.named {
            argv.push(format!("--{name}"));
            argv.push(value.clone());
        }
        argv
    }
}

/// Everything a root command needs to run one command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Full argument vector, `args[0]` being the program name.
    pub args: Vec<String>,
    /// Environment snapshot visible to the command.
    pub env: BTreeMap<String, String>,
}

impl ExecutionContext {
    /// Build a context from explicit parts.
    pub const fn new(args: Vec<String>, env: BTreeMap<String, String>) -> Self {
        Self { args, env }
    }

    /// Build a context from the real process arguments and environment.
    pub fn from_process() -> Self {
        let env = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { args: std::env::args().collect(), env }
    }

    /// Look up an environment variable; empty values count as unset.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_to_argv_layout() {
        let request = InvocationRequest::new(["get", "function", "myfunc"]).flag("output", "yaml");
        assert_eq!(
            request.to_argv(DEFAULT_PROGRAM_NAME),
            vec!["nuctl", "get", "function", "myfunc", "--output", "yaml"]
        );
    }

    #[test]
    fn test_to_argv_without_arguments() {
        let request = InvocationRequest::default();
        assert_eq!(request.to_argv("nuctl"), vec!["nuctl"]);
    }

    #[test]
    fn test_repeated_flag_keeps_last_value() {
        let request = InvocationRequest::new(["get"]).flag("output", "yaml").flag("output", "json");
        assert_eq!(request.named().len(), 1);
        assert_eq!(request.named()["output"], "json");
    }

    #[test]
    fn test_flags_from_pairs() {
        let request =
            InvocationRequest::new(["deploy", "echo"]).flags([("runtime", "python"), ("replicas", "2")]);
        assert_eq!(
            request.to_argv("nuctl"),
            vec!["nuctl", "deploy", "echo", "--replicas", "2", "--runtime", "python"]
        );
    }

    #[test]
    fn test_context_var_treats_empty_as_unset() {
        let mut env = BTreeMap::new();
        env.insert("NUCTL_PLATFORM".to_string(), String::new());
        env.insert("NUCLIO_LABEL".to_string(), "1.2.3".to_string());
        let ctx = ExecutionContext::new(vec!["nuctl".to_string()], env);

        assert_eq!(ctx.var("NUCTL_PLATFORM"), None);
        assert_eq!(ctx.var("NUCLIO_LABEL"), Some("1.2.3"));
        assert_eq!(ctx.var("MISSING"), None);
    }

    proptest! {
        #[test]
        fn prop_argv_is_program_positional_then_flag_pairs(
            positional in proptest::collection::vec("[a-z0-9-]{1,8}", 0..6),
            named in proptest::collection::btree_map("[a-z]{1,8}", "[a-z0-9]{0,8}", 0..5),
        ) {
            let request = InvocationRequest::new(positional.clone()).flags(named.clone());
            let argv = request.to_argv("nuctl");

            prop_assert_eq!(argv.len(), 1 + positional.len() + 2 * named.len());
            prop_assert_eq!(&argv[0], "nuctl");
            prop_assert_eq!(&argv[1..=positional.len()], positional.as_slice());

            let pairs: BTreeMap<String, String> = argv[1 + positional.len()..]
                .chunks(2)
                .map(|pair| (pair[0].trim_start_matches("--").to_string(), pair[1].clone()))
                .collect();
            prop_assert_eq!(pairs, named);
        }
    }
}
