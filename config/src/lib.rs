//! Reader configuration.
//!
//! [`ReaderConfig`] is an immutable value handed to a reader before it starts.
//! The defaults below are only defaults: a config file, the environment, or the
//! caller can override each of them.

mod file;

pub use file::{
    DelimiterSetting, ENV_DELIMITER, ENV_NAME, ENV_QUEUE_CAPACITY, LinepumpConfig, ReaderSection,
    config_path,
};

use std::num::NonZeroUsize;
use std::path::PathBuf;

use thiserror::Error;

/// Record terminator used when nothing else is configured.
pub const DEFAULT_DELIMITER: u8 = b'\n';

/// Queue capacity used when nothing else is configured.
pub const DEFAULT_QUEUE_CAPACITY: NonZeroUsize = NonZeroUsize::new(64).unwrap();

/// Diagnostic label used when nothing else is configured.
pub const DEFAULT_READER_NAME: &str = "reader";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid delimiter {value:?}: {reason}")]
    InvalidDelimiter { value: String, reason: &'static str },
    #[error("queue capacity must be at least 1")]
    InvalidCapacity,
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    /// The config file involved, if the error came from one.
    #[must_use]
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Configuration of a single reader.
///
/// Fields are private; the only way to change a value is to build a new
/// config, so nothing can mutate it underneath a running producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    name: String,
    delimiter: u8,
    queue_capacity: NonZeroUsize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_READER_NAME.to_string(),
            delimiter: DEFAULT_DELIMITER,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl ReaderConfig {
    /// Label used in diagnostics. Has no behavioral effect.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Like [`Self::with_queue_capacity`] for callers holding a plain `usize`.
    pub fn try_with_queue_capacity(self, capacity: usize) -> Result<Self, ConfigError> {
        let capacity = NonZeroUsize::new(capacity).ok_or(ConfigError::InvalidCapacity)?;
        Ok(self.with_queue_capacity(capacity))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    #[must_use]
    pub fn queue_capacity(&self) -> NonZeroUsize {
        self.queue_capacity
    }
}

/// Parse a delimiter written by a human.
///
/// Accepts a single ASCII character (`";"`), one of the escapes `\n`, `\r`,
/// `\t`, `\0`, `\\`, or a hex byte such as `0x1e`.
pub fn parse_delimiter(raw: &str) -> Result<u8, ConfigError> {
    let invalid = |reason| ConfigError::InvalidDelimiter {
        value: raw.to_string(),
        reason,
    };

    match raw {
        "" => return Err(invalid("delimiter must not be empty")),
        "\\n" => return Ok(b'\n'),
        "\\r" => return Ok(b'\r'),
        "\\t" => return Ok(b'\t'),
        "\\0" => return Ok(0),
        "\\\\" => return Ok(b'\\'),
        _ => {}
    }

    if let Some(hex) = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
    {
        if hex.is_empty() || hex.len() > 2 {
            return Err(invalid("hex delimiter must be one byte, e.g. 0x1e"));
        }
        return u8::from_str_radix(hex, 16).map_err(|_| invalid("not a hex byte"));
    }

    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c as u8),
        (Some(_), None) => Err(invalid("delimiter must be ASCII")),
        _ if raw.starts_with('\\') => Err(invalid("unknown escape")),
        _ => Err(invalid("delimiter must be a single byte")),
    }
}
