//! Build information read from the environment.
//!
//! Release builds stamp these values in through the environment of the
//! process; tests get sensible defaults without any stamping.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version label variable.
pub const LABEL_ENV: &str = "NUCLIO_LABEL";
/// Git commit variable.
pub const GIT_COMMIT_ENV: &str = "NUCLIO_GIT_COMMIT";
/// Target OS variable.
pub const OS_ENV: &str = "NUCLIO_OS";
/// Target architecture variable.
pub const ARCH_ENV: &str = "NUCLIO_ARCH";

/// Version and target of the tool under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    /// Release label.
    pub label: String,
    /// Commit the build came from.
    pub git_commit: String,
    /// Target operating system.
    pub os: String,
    /// Target architecture.
    pub arch: String,
}

impl VersionInfo {
    /// Read version info from an environment snapshot, falling back to the
    /// crate version and the host target.
    pub fn from_env(env: &BTreeMap<String, String>) -> Self {
        let get = |name: &str, default: &str| {
            env.get(name).filter(|v| !v.is_empty()).cloned().unwrap_or_else(|| default.to_string())
        };

        Self {
            label: get(LABEL_ENV, crate::VERSION),
            git_commit: get(GIT_COMMIT_ENV, "unknown"),
            os: get(OS_ENV, std::env::consts::OS),
            arch: get(ARCH_ENV, std::env::consts::ARCH),
        }
    }
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Client version:\nLabel: {}, Git commit: {}, OS: {}, Arch: {}",
            self.label, self.git_commit, self.os, self.arch
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let info = VersionInfo::from_env(&BTreeMap::new());
        assert_eq!(info.label, crate::VERSION);
        assert_eq!(info.git_commit, "unknown");
        assert_eq!(info.os, std::env::consts::OS);
    }

    #[test]
    fn test_reads_stamped_values() {
        let env: BTreeMap<String, String> = [
            (LABEL_ENV, "1.13.0"),
            (GIT_COMMIT_ENV, "4f1c2e9"),
            (OS_ENV, "linux"),
            (ARCH_ENV, ""),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let info = VersionInfo::from_env(&env);
        assert_eq!(info.label, "1.13.0");
        assert_eq!(info.git_commit, "4f1c2e9");
        assert_eq!(info.arch, std::env::consts::ARCH);
        assert!(info.to_string().contains("Label: 1.13.0, Git commit: 4f1c2e9"));
    }
}
