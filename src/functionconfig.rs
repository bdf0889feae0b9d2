//! Function configuration documents, as printed by
//! `nuctl get function --output yaml` and consumed by `nuctl import`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Namespace used when a document does not name one.
pub const DEFAULT_NAMESPACE: &str = "nuclio";

/// A function's configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Identity of the function.
    pub meta: Meta,
    /// How the function is built and run.
    #[serde(default)]
    pub spec: Spec,
}

/// Function identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    /// Function name.
    pub name: String,
    /// Namespace the function lives in.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    /// Labels.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Annotations.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Function spec. Only the fields the CLI displays are modelled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spec {
    /// Free-form description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Entry point, e.g. `main:handler`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub handler: String,
    /// Runtime, e.g. `python:3.9`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub runtime: String,
    /// Image the function runs from.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
    /// Fixed replica count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,
    /// Environment variables passed to the function.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
}

/// One environment variable of a function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    /// Variable name.
    pub name: String,
    /// Variable value.
    #[serde(default)]
    pub value: String,
}

/// Lifecycle state of a function on a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionState {
    /// Deployed and serving.
    #[default]
    Ready,
    /// Known to the platform but never deployed.
    Imported,
    /// Deployment failed.
    Error,
}

impl FunctionState {
    /// Lowercase name, as shown in tables.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Imported => "imported",
            Self::Error => "error",
        }
    }
}

/// Platform-side status of a function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Current state.
    pub state: FunctionState,
    /// Detail for error states.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Config {
    /// Parse a single YAML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or `meta.name` is empty.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a stream of `---`-separated YAML documents, skipping empty ones.
    ///
    /// # Errors
    ///
    /// Returns an error if any document is invalid.
    pub fn from_yaml_documents(yaml: &str) -> Result<Vec<Self>> {
        let mut configs = Vec::new();
        for document in serde_yaml::Deserializer::from_str(yaml) {
            let value = serde_yaml::Value::deserialize(document)?;
            if value.is_null() {
                continue;
            }
            let config: Self = serde_yaml::from_value(value)?;
            config.validate()?;
            configs.push(config);
        }
        Ok(configs)
    }

    /// The namespace, defaulted.
    pub fn namespace(&self) -> &str {
        if self.meta.namespace.is_empty() {
            DEFAULT_NAMESPACE
        } else {
            &self.meta.namespace
        }
    }

    fn validate(&self) -> Result<()> {
        if self.meta.name.trim().is_empty() {
            return Err(Error::Yaml(serde::de::Error::custom("meta.name must not be empty")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_minimal() {
        let config = Config::from_yaml("meta:\n  name: myfunc\n").unwrap();
        assert_eq!(config.meta.name, "myfunc");
        assert_eq!(config.namespace(), DEFAULT_NAMESPACE);
        assert_eq!(config.spec, Spec::default());
    }

    #[test]
    fn test_decode_full() {
        let yaml = r"
meta:
  name: echo
  namespace: staging
  labels:
    nuclio.io/project-name: default
spec:
  runtime: python:3.9
  handler: main:handler
  replicas: 2
  env:
    - name: GREETING
      value: hello
";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.namespace(), "staging");
        assert_eq!(config.spec.replicas, Some(2));
        assert_eq!(config.spec.env[0], EnvVar { name: "GREETING".into(), value: "hello".into() });
        assert_eq!(config.meta.labels["nuclio.io/project-name"], "default");
    }

    #[test]
    fn test_missing_name_rejected() {
        assert!(Config::from_yaml("meta:\n  namespace: nuclio\n").is_err());
        assert!(Config::from_yaml("meta:\n  name: ''\n").is_err());
    }

    #[test]
    fn test_multiple_documents() {
        let yaml = "meta:\n  name: one\n---\n---\nmeta:\n  name: two\n";
        let names: Vec<String> =
            Config::from_yaml_documents(yaml).unwrap().into_iter().map(|c| c.meta.name).collect();
        assert_eq!(names, vec!["one", "two"]);
    }

    #[test]
    fn test_serialized_yaml_omits_empty_fields() {
        let config = Config {
            meta: Meta { name: "hello".into(), ..Default::default() },
            spec: Spec { runtime: "golang".into(), ..Default::default() },
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("namespace"));
        assert!(!yaml.contains("replicas"));
        assert_eq!(Config::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(FunctionState::Imported.as_str(), "imported");
        assert_eq!(serde_yaml::to_string(&FunctionState::Ready).unwrap().trim(), "ready");
    }
}
