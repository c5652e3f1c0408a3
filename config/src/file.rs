//! `~/.linepump/config.toml` loading and environment overrides.
//!
//! ```toml
//! [reader]
//! name = "ingest"
//! delimiter = ";"      # or an integer byte: delimiter = 30
//! queue_capacity = 128
//! ```

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{ConfigError, ReaderConfig, parse_delimiter};

pub const ENV_NAME: &str = "LINEPUMP_NAME";
pub const ENV_DELIMITER: &str = "LINEPUMP_DELIMITER";
pub const ENV_QUEUE_CAPACITY: &str = "LINEPUMP_QUEUE_CAPACITY";

#[derive(Debug, Default, Deserialize)]
pub struct LinepumpConfig {
    pub reader: Option<ReaderSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReaderSection {
    pub name: Option<String>,
    pub delimiter: Option<DelimiterSetting>,
    pub queue_capacity: Option<usize>,
}

/// A delimiter as written in TOML: either a string understood by
/// [`parse_delimiter`] or a raw byte value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DelimiterSetting {
    Byte(u8),
    Text(String),
}

impl DelimiterSetting {
    pub fn to_byte(&self) -> Result<u8, ConfigError> {
        match self {
            DelimiterSetting::Byte(byte) => Ok(*byte),
            DelimiterSetting::Text(text) => parse_delimiter(text),
        }
    }
}

impl LinepumpConfig {
    /// Load the config from the default location.
    ///
    /// A missing file is not an error: returns `Ok(None)`.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    /// Load the config from an explicit path. A missing file yields `Ok(None)`.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// Apply the `[reader]` section on top of `base`.
    pub fn apply_to(&self, base: ReaderConfig) -> Result<ReaderConfig, ConfigError> {
        let Some(section) = &self.reader else {
            return Ok(base);
        };

        let mut config = base;
        if let Some(name) = &section.name {
            config = config.with_name(name.clone());
        }
        if let Some(delimiter) = &section.delimiter {
            config = config.with_delimiter(delimiter.to_byte()?);
        }
        if let Some(capacity) = section.queue_capacity {
            config = config.try_with_queue_capacity(capacity)?;
        }
        Ok(config)
    }

    /// File settings, then `LINEPUMP_*` environment overrides, on top of the defaults.
    pub fn resolve(config: Option<&Self>) -> Result<ReaderConfig, ConfigError> {
        let base = match config {
            Some(config) => config.apply_to(ReaderConfig::default())?,
            None => ReaderConfig::default(),
        };
        apply_env_overrides(base, |var| env::var(var).ok())
    }
}

/// Override `base` with whatever `lookup` finds for the `LINEPUMP_*` variables.
///
/// `lookup` is injected so tests don't have to mutate the process environment.
pub(crate) fn apply_env_overrides(
    base: ReaderConfig,
    lookup: impl Fn(&'static str) -> Option<String>,
) -> Result<ReaderConfig, ConfigError> {
    let mut config = base;

    if let Some(name) = lookup(ENV_NAME)
        && !name.trim().is_empty()
    {
        config = config.with_name(name);
    }

    if let Some(raw) = lookup(ENV_DELIMITER) {
        let delimiter = parse_delimiter(&raw).map_err(|err| ConfigError::InvalidEnv {
            var: ENV_DELIMITER,
            value: raw.clone(),
            reason: err.to_string(),
        })?;
        config = config.with_delimiter(delimiter);
    }

    if let Some(raw) = lookup(ENV_QUEUE_CAPACITY) {
        let invalid = |reason: String| ConfigError::InvalidEnv {
            var: ENV_QUEUE_CAPACITY,
            value: raw.clone(),
            reason,
        };
        let capacity: usize = raw.trim().parse().map_err(|e| invalid(format!("{e}")))?;
        config = config
            .try_with_queue_capacity(capacity)
            .map_err(|e| invalid(e.to_string()))?;
    }

    Ok(config)
}

pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".linepump").join("config.toml"))
}
