//! Generator configuration loaded from `xgsql.toml`.
//!
//! ```toml
//! max_depth = 256
//!
//! [dialect]
//! identifier_quote = "\""
//! parameter_prefix = ":"
//! default_schema = "SYSDBA"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

pub const CONFIG_FILE: &str = "xgsql.toml";

/// Top-level generator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub dialect: DialectConfig,
    /// Maximum nesting depth of the command tree.
    pub max_depth: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            dialect: DialectConfig::default(),
            max_depth: 256,
        }
    }
}

/// Dialect-level text conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialectConfig {
    pub identifier_quote: String,
    pub parameter_prefix: String,
    /// Stem of generated parameter names (`gp` gives `:gp1`, `:gp2`, ...).
    pub parameter_stem: String,
    /// Schema left out of rendered table names.
    pub default_schema: String,
    pub identity_function: String,
    pub row_count_check: String,
    /// Row-number pseudo column used to render skips.
    pub row_index: String,
    /// Prefix of the per-table side table holding generated GUID keys.
    pub guid_identity_table: String,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self {
            identifier_quote: "\"".to_string(),
            parameter_prefix: ":".to_string(),
            parameter_stem: "gp".to_string(),
            default_schema: "SYSDBA".to_string(),
            identity_function: "last_insert_id()".to_string(),
            row_count_check: "row_count() > 0".to_string(),
            row_index: "ROWNUM".to_string(),
            guid_identity_table: "tmpIdentity_".to_string(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load from a file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Resolve the config: the explicit path, then `./xgsql.toml`, then the
    /// user config directory, then built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }
        for candidate in Self::search_paths() {
            if candidate.exists() {
                debug!(path = %candidate.display(), "loading config");
                return Self::from_path(&candidate);
            }
        }
        Ok(Self::default())
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("xgsql").join("config.toml"));
        }
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = GeneratorConfig::from_toml(
            r#"
            max_depth = 64

            [dialect]
            default_schema = "APP"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_depth, 64);
        assert_eq!(config.dialect.default_schema, "APP");
        assert_eq!(config.dialect.parameter_prefix, ":");
        assert_eq!(config.dialect.row_index, "ROWNUM");
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = GeneratorConfig::from_toml("").unwrap();
        assert_eq!(config, GeneratorConfig::default());
    }

    #[test]
    fn test_missing_explicit_path() {
        let err = GeneratorConfig::load(Some(Path::new("/nonexistent/xgsql.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
