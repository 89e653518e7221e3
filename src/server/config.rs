//! Embedding Server Configuration
//!
//! Loaded from `config.toml`. Every section is optional and falls back to the
//! defaults below, so the server also runs with no file at all.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::{EmbeddingError, ModelConfig};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub network: NetworkConfig,
    pub model: ModelConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub bind_address: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:7860".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub log_level: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EmbeddingError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self, EmbeddingError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_str(content: &str) -> Result<Self, EmbeddingError> {
        let config: ServerConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.network.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(EmbeddingError::ConfigError {
                message: format!("Invalid bind address '{}'", self.network.bind_address),
            });
        }
        self.model.validate()
    }

    /// Filter directive used when `RUST_LOG` is not set
    pub fn log_filter(&self) -> String {
        let level = match self.monitoring.log_level.to_lowercase().as_str() {
            level @ ("trace" | "debug" | "info" | "warn" | "error") => level.to_string(),
            _ => "info".to_string(),
        };
        format!("minilm_embedding_server={level},{level}")
    }
}
