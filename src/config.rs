/// Service configuration loader - parses surfsup.toml
///
/// Keeps deployment knobs (listen port, worker count, which station the
/// tobs endpoint reports, how far back the yearly endpoints look) out of
/// the code. Every field has a default, so the file itself is optional.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_PATH: &str = "surfsup.toml";

/// The most active station in the Hawaii dataset.
pub const DEFAULT_TOBS_STATION: &str = "USC00519281";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration structure for TOML parsing
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub dataset: DatasetConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Size of the request worker pool
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 5000,
            workers: 4,
        }
    }
}

/// Where the dataset lives and how the yearly endpoints slice it
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetConfig {
    /// PostgreSQL schema holding `measurement` and `station`
    pub schema: String,
    /// Station reported by /api/v1.0/tobs
    pub tobs_station: String,
    /// How far before the latest date the precipitation and tobs windows start
    pub lookback_months: u32,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            schema: "public".to_string(),
            tobs_station: DEFAULT_TOBS_STATION.to_string(),
            lookback_months: 12,
        }
    }
}

impl ServiceConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(contents: &str, path: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from `path`.
    ///
    /// When `path` is `None` the default `surfsup.toml` is used if it
    /// exists, otherwise built-in defaults apply. An explicitly named file
    /// must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p, true),
            None => (Path::new(DEFAULT_CONFIG_PATH), false),
        };

        if !required && !path.exists() {
            tracing::debug!("{} not found, using default configuration", DEFAULT_CONFIG_PATH);
            return Ok(Self::default());
        }

        let display = path.display().to_string();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;

        Self::from_toml(&contents, &display)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be non-zero".into()));
        }
        if self.server.workers == 0 {
            return Err(ConfigError::Invalid("server.workers must be at least 1".into()));
        }
        if self.dataset.lookback_months == 0 {
            return Err(ConfigError::Invalid("dataset.lookback_months must be at least 1".into()));
        }
        if self.dataset.tobs_station.trim().is_empty() {
            return Err(ConfigError::Invalid("dataset.tobs_station must not be empty".into()));
        }
        if !is_plain_identifier(&self.dataset.schema) {
            return Err(ConfigError::Invalid(format!(
                "dataset.schema '{}' must be a plain SQL identifier",
                self.dataset.schema
            )));
        }
        Ok(())
    }

    /// `bind_address:port` for the HTTP listener
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }
}

/// Lowercase letters, digits and underscores, not starting with a digit.
/// The schema name is interpolated into `SET search_path`, so nothing else
/// is allowed through.
fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
