//! Maintenance tool configuration.
//!
//! # Environment Variables
//!
//! - `SLOTDB_TABLE_PATH`: Table file to maintain (required)
//! - `SLOTDB_INDEX_PATH`: Index file (default: the table path with extension `idx`)
//! - `SLOTDB_COMPACT`: Compact the table before reindexing (default: `false`)

use std::path::PathBuf;

/// Maintenance tool configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Table file.
    pub table_path: PathBuf,
    /// Index file, rebuilt on every run.
    pub index_path: PathBuf,
    /// Whether to compact the table first.
    pub compact: bool,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is missing.
    MissingEnvVar(String),
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnvVar(name) => {
                write!(f, "missing required environment variable: {name}")
            }
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl StoreConfig {
    pub const TABLE_PATH_VAR: &'static str = "SLOTDB_TABLE_PATH";
    pub const INDEX_PATH_VAR: &'static str = "SLOTDB_INDEX_PATH";
    pub const COMPACT_VAR: &'static str = "SLOTDB_COMPACT";
    /// Extension given to the default index path.
    pub const DEFAULT_INDEX_EXTENSION: &'static str = "idx";

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let table_path = Self::load_table_path(&lookup)?;
        let index_path = lookup(Self::INDEX_PATH_VAR)
            .filter(|value| !value.is_empty())
            .map_or_else(
                || table_path.with_extension(Self::DEFAULT_INDEX_EXTENSION),
                PathBuf::from,
            );
        let compact = Self::load_compact(&lookup)?;

        Ok(Self {
            table_path,
            index_path,
            compact,
        })
    }

    fn load_table_path<F>(lookup: &F) -> Result<PathBuf, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = lookup(Self::TABLE_PATH_VAR)
            .ok_or_else(|| ConfigError::MissingEnvVar(Self::TABLE_PATH_VAR.to_string()))?;

        if value.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: Self::TABLE_PATH_VAR.to_string(),
                message: "must not be empty".to_string(),
            });
        }

        Ok(PathBuf::from(value))
    }

    fn load_compact<F>(lookup: &F) -> Result<bool, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(Self::COMPACT_VAR).as_deref() {
            None | Some("" | "false" | "0") => Ok(false),
            Some("true" | "1") => Ok(true),
            Some(other) => Err(ConfigError::InvalidValue {
                name: Self::COMPACT_VAR.to_string(),
                message: format!("'{other}' is not one of true, false, 1, 0"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<StoreConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StoreConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("SLOTDB_TABLE_PATH", "/data/routers.bin")]).expect("load");
        assert_eq!(config.table_path, PathBuf::from("/data/routers.bin"));
        assert_eq!(config.index_path, PathBuf::from("/data/routers.idx"));
        assert!(!config.compact);
    }

    #[test]
    fn test_explicit_values() {
        let config = load(&[
            ("SLOTDB_TABLE_PATH", "t.bin"),
            ("SLOTDB_INDEX_PATH", "other.index"),
            ("SLOTDB_COMPACT", "1"),
        ])
        .expect("load");
        assert_eq!(config.index_path, PathBuf::from("other.index"));
        assert!(config.compact);
    }

    #[test]
    fn test_missing_table_path() {
        assert_eq!(
            load(&[]),
            Err(ConfigError::MissingEnvVar("SLOTDB_TABLE_PATH".to_string()))
        );
        assert!(matches!(
            load(&[("SLOTDB_TABLE_PATH", "")]),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_invalid_compact_flag() {
        let result = load(&[("SLOTDB_TABLE_PATH", "t.bin"), ("SLOTDB_COMPACT", "yes")]);
        assert_eq!(
            result.expect_err("should reject").to_string(),
            "invalid value for SLOTDB_COMPACT: 'yes' is not one of true, false, 1, 0"
        );
    }

    #[test]
    fn test_config_error_display_missing() {
        let error = ConfigError::MissingEnvVar("TEST_VAR".to_string());
        assert_eq!(
            error.to_string(),
            "missing required environment variable: TEST_VAR"
        );
    }
}
