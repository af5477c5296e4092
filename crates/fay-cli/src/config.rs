//! Config file loading.
//!
//! The file is TOML with two optional tables:
//!
//! ```toml
//! [manager]
//! threading = "single"     # or "multi" (default)
//! initial_capacity = 8
//!
//! [logging]
//! level = "debug"
//! format = "compact"
//! ```
//!
//! Keys left out keep their built-in value (`defaults.toml`).

use std::path::{Path, PathBuf};

use fay_telemetry::{LogConfig, LogFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// File looked up in the working directory when no path is given.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "fay.toml";

/// Built-in values every config file is layered over.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Largest accepted `manager.initial_capacity`.
pub(crate) const MAX_INITIAL_CAPACITY: usize = 65_536;

/// Errors from loading or validating the config file.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`FayConfig`].
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// A value parsed but is not usable.
    #[error("invalid value for {field}: {message}")]
    Invalid { field: String, message: String },
}

pub(crate) type ConfigResult<T> = Result<T, ConfigError>;

/// Which lock strategy the manager is built with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ThreadingMode {
    /// `EventManager`: mutex-guarded, shareable across threads.
    #[default]
    Multi,
    /// `SingleThreadedEventManager`: no locking, confined to one thread.
    Single,
}

/// Construction-time choices for the event manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ManagerConfig {
    pub(crate) threading: ThreadingMode,
    pub(crate) initial_capacity: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            threading: ThreadingMode::default(),
            initial_capacity: 8,
        }
    }
}

/// Everything the `fay` binary reads from its config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct FayConfig {
    pub(crate) manager: ManagerConfig,
    pub(crate) logging: LogConfig,
}

impl Default for FayConfig {
    fn default() -> Self {
        Self {
            manager: ManagerConfig::default(),
            logging: LogConfig::new("warn").with_format(LogFormat::Compact),
        }
    }
}

/// Load the config.
///
/// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_FILE`] in the
/// working directory is used if present. The file is merged over the
/// built-in defaults key by key, so a partial `[logging]` table keeps the
/// default level and format for whatever it leaves out.
pub(crate) fn load(path: Option<&Path>) -> ConfigResult<FayConfig> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let (source, overlay) = match path {
        Some(path) => (path.to_path_buf(), Some(parse(path, &read(path)?)?)),
        None => {
            let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
            let overlay = try_load_file(&fallback)?;
            (fallback, overlay)
        },
    };

    if let Some(overlay) = &overlay {
        deep_merge(&mut merged, overlay);
        debug!(path = %source.display(), "loaded config file");
    }

    let config: FayConfig =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: source.display().to_string(),
                source: e,
            })?;

    validate(&config)?;
    Ok(config)
}

fn read(path: &Path) -> ConfigResult<String> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })
}

/// Read `path` if it exists. A missing file is `Ok(None)`.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse(path, &content).map(Some),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, using defaults");
            Ok(None)
        },
        Err(e) => Err(ConfigError::ReadError {
            path: path.display().to_string(),
            source: e,
        }),
    }
}

fn parse(path: &Path, content: &str) -> ConfigResult<toml::Value> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })
}

/// Merge `overlay` into `base`. Tables merge per key; anything else in the
/// overlay replaces the base value.
fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}

fn validate(config: &FayConfig) -> ConfigResult<()> {
    if config.logging.level.trim().is_empty() {
        return Err(ConfigError::Invalid {
            field: "logging.level".to_owned(),
            message: "must not be empty".to_owned(),
        });
    }
    if config.manager.initial_capacity > MAX_INITIAL_CAPACITY {
        return Err(ConfigError::Invalid {
            field: "manager.initial_capacity".to_owned(),
            message: format!(
                "{} exceeds the maximum of {MAX_INITIAL_CAPACITY}",
                config.manager.initial_capacity
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = FayConfig::default();
        assert_eq!(config.manager.threading, ThreadingMode::Multi);
        assert_eq!(config.manager.initial_capacity, 8);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_embedded_defaults_match_default_impl() {
        let parsed: FayConfig = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(parsed, FayConfig::default());
    }

    #[test]
    fn test_load_full_file() {
        let file = write_config(
            r#"
            [manager]
            threading = "single"
            initial_capacity = 32

            [logging]
            level = "debug"
            format = "json"
            "#,
        );

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.manager.threading, ThreadingMode::Single);
        assert_eq!(config.manager.initial_capacity, 32);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let file = write_config("[manager]\nthreading = \"single\"\n");

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.manager.threading, ThreadingMode::Single);
        assert_eq!(config.manager.initial_capacity, 8);
        assert_eq!(config.logging, FayConfig::default().logging);
    }

    #[test]
    fn test_partial_logging_table_keeps_other_defaults() {
        let file = write_config("[logging]\nlevel = \"debug\"\n");
        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Compact);

        let file = write_config("[logging]\nformat = \"json\"\n");
        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_deep_merge_replaces_scalars_and_merges_tables() {
        let mut base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\nz = 4\n").unwrap();
        deep_merge(&mut base, &overlay);

        assert_eq!(base["a"]["x"].as_integer(), Some(1));
        assert_eq!(base["a"]["y"].as_integer(), Some(3));
        assert_eq!(base["a"]["z"].as_integer(), Some(4));
    }

    #[test]
    fn test_unknown_threading_mode_rejected() {
        let file = write_config("[manager]\nthreading = \"both\"\n");

        let err = load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");

        let err = load(Some(&missing)).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn test_empty_level_rejected() {
        let file = write_config("[logging]\nlevel = \"  \"\n");

        let err = load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("logging.level"));
    }

    #[test]
    fn test_huge_capacity_rejected() {
        let file = write_config("[manager]\ninitial_capacity = 4611686018427387904\n");

        let err = load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("manager.initial_capacity"));
    }

    #[test]
    fn test_capacity_at_limit_accepted() {
        let file = write_config(&format!(
            "[manager]\ninitial_capacity = {MAX_INITIAL_CAPACITY}\n"
        ));

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.manager.initial_capacity, MAX_INITIAL_CAPACITY);
    }
}
