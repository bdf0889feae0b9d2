//! Locations of the test fixtures shipped with the source tree.

use std::path::PathBuf;

/// Environment variable that points at a checkout of the source tree.
pub const SOURCE_DIR_ENV: &str = "NUCLIO_SOURCE_DIR";

/// Root of the source tree.
///
/// Uses `$NUCLIO_SOURCE_DIR` when set, otherwise the directory this crate was
/// built from.
#[must_use]
pub fn source_dir() -> PathBuf {
    std::env::var_os(SOURCE_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")), PathBuf::from)
}

/// Directory of function source fixtures (`test/_functions`).
#[must_use]
pub fn functions_dir() -> PathBuf {
    source_dir().join("test").join("_functions")
}

/// Directory of function configuration fixtures (`test/_function_configs`).
#[must_use]
pub fn function_configs_dir() -> PathBuf {
    source_dir().join("test").join("_function_configs")
}

/// Directory of import fixtures (`test/_imports`).
#[must_use]
pub fn imports_dir() -> PathBuf {
    source_dir().join("test").join("_imports")
}
