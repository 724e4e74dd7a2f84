use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Looked up in the working directory unless `--config` names another file.
pub const DEFAULT_CONFIG_PATH: &str = "qdl.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Xml,
    Outline,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub format: Format,
    /// Exit non-zero when warnings were reported.
    pub deny_warnings: bool,
    /// Report compiler-internal diagnostics.
    pub show_internal: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            format: Format::Xml,
            deny_warnings: false,
            show_internal: true,
        }
    }
}

impl Config {
    /// `Ok(None)` when there is no file at `config_path`.
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config = toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
            config_path: config_path.to_path_buf(),
            source,
        })?;
        Ok(Some(config))
    }

    /// Load `path`, or `qdl.toml` when no path is given. Only an explicitly
    /// named file has to exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from_path(path)?.ok_or_else(|| {
                ConfigError::ConfigReadError {
                    config_path: path.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
                }
            }),
            None => Ok(Self::load_from_path(DEFAULT_CONFIG_PATH)?.unwrap_or_default()),
        }
    }
}
