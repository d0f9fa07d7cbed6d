//! CLI configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via REXPRO_CONFIG or --config)
//! 3. Environment variables
//! 4. Command-line flags (applied by `main`)

use rexpro_protocol::{DEFAULT_LANGUAGE, DEFAULT_PORT};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Graph scripts run against unless `--graph` says otherwise.
pub const DEFAULT_GRAPH: &str = "tinkergraph";

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rexster RexPro address.
    #[serde(with = "socket_addr_serde")]
    pub server: SocketAddr,
    /// Graph name sent as `graphName` meta.
    pub graph: String,
    /// Script language.
    pub language: String,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Response timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            graph: DEFAULT_GRAPH.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Loads configuration from `path` (if any), then applies environment
    /// variable overrides.
    ///
    /// The result is not validated; command-line flags still apply on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Applies `REXPRO_*` overrides read through `lookup`.
    ///
    /// Values that fail to parse are ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("REXPRO_SERVER") {
            match addr.parse() {
                Ok(parsed) => self.server = parsed,
                Err(_) => tracing::warn!("Ignoring invalid REXPRO_SERVER: {}", addr),
            }
        }

        if let Some(graph) = lookup("REXPRO_GRAPH") {
            self.graph = graph;
        }

        if let Some(language) = lookup("REXPRO_LANGUAGE") {
            self.language = language;
        }

        if let Some(secs) = lookup("REXPRO_CONNECT_TIMEOUT_SECS") {
            match secs.parse() {
                Ok(secs) => self.connect_timeout_secs = secs,
                Err(_) => tracing::warn!("Ignoring invalid REXPRO_CONNECT_TIMEOUT_SECS: {}", secs),
            }
        }

        if let Some(secs) = lookup("REXPRO_REQUEST_TIMEOUT_SECS") {
            match secs.parse() {
                Ok(secs) => self.request_timeout_secs = secs,
                Err(_) => tracing::warn!("Ignoring invalid REXPRO_REQUEST_TIMEOUT_SECS: {}", secs),
            }
        }
    }

    /// Checks values that would make every request fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.language.trim().is_empty() {
            return Err(ConfigError::Validation("language must not be empty".into()));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "connect_timeout_secs must be positive".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "request_timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("configuration validation failed: {0}")]
    Validation(String),
}

/// Serde helpers for SocketAddr (kept as a string in YAML).
mod socket_addr_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::net::SocketAddr;

    pub fn serialize<S>(addr: &SocketAddr, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(addr)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SocketAddr, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
