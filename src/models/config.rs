//! Configuration for the sentence encoder
//!
//! This is the `[model]` section of `config.toml`. Every field has a default
//! matching the all-MiniLM-L6-v2 export, so the section may be omitted.

use serde::{Deserialize, Serialize};

use crate::models::EmbeddingError;

/// Configuration for the loaded encoder
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model identifier reported by `/health`
    pub name: String,

    /// File paths (relative to the working directory)
    pub model_path: String,
    pub tokenizer_path: String,

    /// Model parameters
    pub embedding_dimension: usize,
    pub max_sequence_length: usize,
    pub pooling_mode: String,

    /// Intra-op threads for ONNX Runtime
    pub num_threads: usize,

    /// Optional path to a dynamically loaded onnxruntime library
    pub onnx_runtime_path: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            model_path: "models/all-MiniLM-L6-v2/model.onnx".to_string(),
            tokenizer_path: "models/all-MiniLM-L6-v2/tokenizer.json".to_string(),
            embedding_dimension: 384,
            max_sequence_length: 256,
            pooling_mode: "mean".to_string(),
            num_threads: 4,
            onnx_runtime_path: String::new(),
        }
    }
}

impl ModelConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.model_path.trim().is_empty() {
            return Err(EmbeddingError::ConfigError {
                message: "model_path cannot be empty".to_string(),
            });
        }

        if self.tokenizer_path.trim().is_empty() {
            return Err(EmbeddingError::ConfigError {
                message: "tokenizer_path cannot be empty".to_string(),
            });
        }

        for (field, value) in [
            ("embedding_dimension", self.embedding_dimension),
            ("max_sequence_length", self.max_sequence_length),
            ("num_threads", self.num_threads),
        ] {
            if value == 0 {
                return Err(EmbeddingError::ConfigError {
                    message: format!("{} must be greater than zero", field),
                });
            }
        }

        // Only mean pooling is implemented by the ONNX encoder
        if self.pooling_mode != "mean" {
            return Err(EmbeddingError::ConfigError {
                message: format!("Unsupported pooling mode '{}'", self.pooling_mode),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ModelConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.embedding_dimension, 384);
        assert_eq!(config.max_sequence_length, 256);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: ModelConfig = toml::from_str(
            r#"
            model_path = "test/model.onnx"
            num_threads = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.model_path, "test/model.onnx");
        assert_eq!(config.num_threads, 2);
        assert_eq!(config.tokenizer_path, "models/all-MiniLM-L6-v2/tokenizer.json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        let mut config = ModelConfig::default();
        config.embedding_dimension = 0;
        assert!(config.validate().is_err());

        let mut config = ModelConfig::default();
        config.pooling_mode = "cls".to_string();
        assert!(config.validate().is_err());

        let mut config = ModelConfig::default();
        config.model_path = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(EmbeddingError::ConfigError { .. })
        ));
    }
}
