//! Platforms functions are deployed to.

use crate::error::{Error, Result};
use crate::functionconfig::{Config, FunctionState, Meta, Spec, Status};
use crate::invocation::ExecutionContext;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable overriding where the local platform keeps functions.
pub const LOCAL_STORE_ENV: &str = "NUCTL_LOCAL_STORE";

/// A function as the platform knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    /// Identity.
    pub meta: Meta,
    /// Configuration.
    #[serde(default)]
    pub spec: Spec,
    /// Platform status.
    #[serde(default)]
    pub status: Status,
}

impl Function {
    /// Wrap a configuration with a fresh status.
    pub fn new(config: Config, state: FunctionState) -> Self {
        Self { meta: config.meta, spec: config.spec, status: Status { state, message: None } }
    }
}

/// Where functions are created, listed and deleted.
pub trait Platform {
    /// Store `function`, replacing any function of the same name.
    ///
    /// # Errors
    ///
    /// Returns an error if the function cannot be stored.
    fn create_function(&self, function: &Function) -> Result<()>;

    /// Functions in `namespace`, sorted by name, optionally just `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FunctionNotFound`] if `name` is given and unknown.
    fn get_functions(&self, namespace: &str, name: Option<&str>) -> Result<Vec<Function>>;

    /// Remove a function.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FunctionNotFound`] if the function is unknown.
    fn delete_function(&self, namespace: &str, name: &str) -> Result<()>;
}

/// Platforms `nuctl` can be pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformKind {
    /// Functions stored on the local filesystem.
    Local,
    /// A Kubernetes cluster.
    Kube,
}

impl FromStr for PlatformKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "local" => Ok(Self::Local),
            "kube" => Ok(Self::Kube),
            other => Err(Error::UnsupportedPlatform(format!(
                "unknown platform '{other}' (expected local or kube)"
            ))),
        }
    }
}

impl PlatformKind {
    /// Open the platform for a command running in `ctx`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPlatform`] for platforms this build cannot
    /// reach.
    pub fn open(self, ctx: &ExecutionContext) -> Result<Box<dyn Platform>> {
        match self {
            Self::Local => Ok(Box::new(LocalPlatform::from_context(ctx)?)),
            Self::Kube => Err(Error::UnsupportedPlatform("kube".to_string())),
        }
    }
}

/// Stores each function as `<root>/<namespace>/<name>.yaml`.
#[derive(Debug, Clone)]
pub struct LocalPlatform {
    root: PathBuf,
}

impl LocalPlatform {
    /// A store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store named by `$NUCTL_LOCAL_STORE` in `ctx`, else `~/.nuctl/local`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Environment`] if neither location is available.
    pub fn from_context(ctx: &ExecutionContext) -> Result<Self> {
        if let Some(root) = ctx.var(LOCAL_STORE_ENV) {
            return Ok(Self::new(root));
        }
        dirs::home_dir().map(|home| Self::new(home.join(".nuctl").join("local"))).ok_or_else(|| {
            Error::Environment {
                name: LOCAL_STORE_ENV.to_string(),
                message: "not set and no home directory found".to_string(),
            }
        })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn function_path(&self, namespace: &str, name: &str) -> Result<PathBuf> {
        for part in [namespace, name] {
            if part.is_empty() || part == "." || part == ".." || part.contains(['/', '\\']) {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("invalid resource name '{part}'"),
                )));
            }
        }
        Ok(self.root.join(namespace).join(format!("{name}.yaml")))
    }
}

impl Platform for LocalPlatform {
    fn create_function(&self, function: &Function) -> Result<()> {
        let namespace = function.meta.namespace.as_str();
        let path = self.function_path(namespace, &function.meta.name)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&path, serde_yaml::to_string(function)?)?;
        tracing::debug!(path = %path.display(), state = function.status.state.as_str(), "Stored function");
        Ok(())
    }

    fn get_functions(&self, namespace: &str, name: Option<&str>) -> Result<Vec<Function>> {
        if let Some(name) = name {
            let path = self.function_path(namespace, name)?;
            return match std::fs::read_to_string(&path) {
                Ok(content) => Ok(vec![serde_yaml::from_str(&content)?]),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Err(Error::FunctionNotFound(name.to_string()))
                }
                Err(e) => Err(e.into()),
            };
        }

        let dir = self.root.join(namespace);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut functions = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                functions.push(serde_yaml::from_str::<Function>(&std::fs::read_to_string(&path)?)?);
            }
        }
        functions.sort_by(|a, b| a.meta.name.cmp(&b.meta.name));
        Ok(functions)
    }

    fn delete_function(&self, namespace: &str, name: &str) -> Result<()> {
        let path = self.function_path(namespace, name)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::FunctionNotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn function(name: &str, state: FunctionState) -> Function {
        let mut config = Config::default();
        config.meta.name = name.to_string();
        config.meta.namespace = "nuclio".to_string();
        Function::new(config, state)
    }

    #[test]
    fn test_platform_kind_parsing() {
        assert_eq!("local".parse::<PlatformKind>().unwrap(), PlatformKind::Local);
        assert_eq!("kube".parse::<PlatformKind>().unwrap(), PlatformKind::Kube);
        let err = "mars".parse::<PlatformKind>().unwrap_err();
        assert!(err.to_string().contains("unknown platform 'mars'"));
    }

    #[test]
    fn test_kube_is_not_supported() {
        let err = PlatformKind::Kube.open(&ExecutionContext::default()).err().unwrap();
        assert_eq!(err.to_string(), "platform not supported: kube");
    }

    #[test]
    fn test_store_location_from_context() {
        let env = BTreeMap::from([(LOCAL_STORE_ENV.to_string(), "/tmp/functions".to_string())]);
        let platform = LocalPlatform::from_context(&ExecutionContext::new(vec![], env)).unwrap();
        assert_eq!(platform.root(), Path::new("/tmp/functions"));
    }

    #[test]
    fn test_create_get_delete() {
        let dir = TempDir::new().unwrap();
        let platform = LocalPlatform::new(dir.path());

        platform.create_function(&function("beta", FunctionState::Ready)).unwrap();
        platform.create_function(&function("alpha", FunctionState::Imported)).unwrap();

        let all = platform.get_functions("nuclio", None).unwrap();
        let names: Vec<&str> = all.iter().map(|f| f.meta.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
        assert_eq!(all[0].status.state, FunctionState::Imported);

        platform.delete_function("nuclio", "alpha").unwrap();
        assert!(matches!(
            platform.get_functions("nuclio", Some("alpha")),
            Err(Error::FunctionNotFound(_))
        ));
        assert!(matches!(
            platform.delete_function("nuclio", "alpha"),
            Err(Error::FunctionNotFound(_))
        ));
    }

    #[test]
    fn test_empty_namespace_lists_nothing() {
        let dir = TempDir::new().unwrap();
        let platform = LocalPlatform::new(dir.path());
        assert!(platform.get_functions("staging", None).unwrap().is_empty());
    }

    #[test]
    fn test_path_traversal_rejected() {
        let dir = TempDir::new().unwrap();
        let platform = LocalPlatform::new(dir.path());
        assert!(platform.create_function(&function("../escape", FunctionState::Ready)).is_err());
        assert!(platform.get_functions("..", Some("x")).is_err());
    }
}
