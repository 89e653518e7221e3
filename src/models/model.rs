//! Model definitions and traits
//!
//! [`SentenceEncoder`] is the only thing the HTTP layer knows about the model.
//! The server holds one `Arc<dyn SentenceEncoder>` built at startup and shares
//! it read-only across requests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::config::ModelConfig;
use crate::models::{Embedding, EmbeddingResult};

/// Information about a model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model name
    pub name: String,
    /// Embedding dimension
    pub dimension: usize,
    /// Maximum sequence length
    pub max_sequence_length: usize,
    /// Pooling mode
    pub pooling_mode: String,
    /// Model file path
    pub model_path: String,
    /// Tokenizer path
    pub tokenizer_path: String,
}

impl From<&ModelConfig> for ModelInfo {
    fn from(config: &ModelConfig) -> Self {
        Self {
            name: config.name.clone(),
            dimension: config.embedding_dimension,
            max_sequence_length: config.max_sequence_length,
            pooling_mode: config.pooling_mode.clone(),
            model_path: config.model_path.clone(),
            tokenizer_path: config.tokenizer_path.clone(),
        }
    }
}

/// Maps sentences to fixed-length vectors
#[async_trait]
pub trait SentenceEncoder: Send + Sync {
    /// Get model information
    fn info(&self) -> &ModelInfo;

    /// Encode every sentence, one vector per input in input order.
    ///
    /// An empty slice yields an empty result.
    async fn encode(&self, sentences: &[String]) -> EmbeddingResult<Vec<Embedding>>;

    /// Get the embedding dimension
    fn dimension(&self) -> usize {
        self.info().dimension
    }
}

/// ONNX-based encoder implementation
#[cfg(feature = "onnx")]
pub mod onnx {
    use super::*;
    use crate::models::EmbeddingError;
    use crate::onnx::{OnnxConfig, OnnxEmbeddingEngine};
    use std::sync::Mutex;
    use tracing::info;

    /// ONNX sentence encoder
    ///
    /// The session needs exclusive access to run, so the engine sits behind a
    /// mutex and inference is moved onto tokio's blocking pool.
    pub struct OnnxSentenceEncoder {
        info: ModelInfo,
        engine: Arc<Mutex<OnnxEmbeddingEngine>>,
    }

    impl OnnxSentenceEncoder {
        /// Load the model and tokenizer described by `config`
        pub fn load(config: &ModelConfig) -> EmbeddingResult<Self> {
            let onnx_config = OnnxConfig::from(config);
            let mut engine = OnnxEmbeddingEngine::new(
                &config.model_path,
                &config.tokenizer_path,
                &onnx_config,
            )?;

            let probe = engine.embed_texts(&["validation test".to_string()])?;
            let dimension = probe.first().map(Vec::len).unwrap_or(0);
            if dimension != config.embedding_dimension {
                return Err(EmbeddingError::ModelLoadFailed {
                    error: format!(
                        "Model produces {}-dimensional embeddings, expected {}",
                        dimension, config.embedding_dimension
                    ),
                });
            }
            info!("Validated {} output dimension: {}", config.name, dimension);

            Ok(Self {
                info: ModelInfo::from(config),
                engine: Arc::new(Mutex::new(engine)),
            })
        }
    }

    #[async_trait]
    impl SentenceEncoder for OnnxSentenceEncoder {
        fn info(&self) -> &ModelInfo {
            &self.info
        }

        async fn encode(&self, sentences: &[String]) -> EmbeddingResult<Vec<Embedding>> {
            if sentences.is_empty() {
                return Ok(Vec::new());
            }

            let engine = Arc::clone(&self.engine);
            let sentences = sentences.to_vec();

            tokio::task::spawn_blocking(move || {
                let mut engine = engine.lock().map_err(|_| EmbeddingError::EmbeddingFailed {
                    error: "ONNX engine lock poisoned".to_string(),
                })?;
                engine.embed_texts(&sentences)
            })
            .await
            .map_err(|e| EmbeddingError::EmbeddingFailed {
                error: format!("Inference task failed: {}", e),
            })?
        }
    }
}

/// Build the production encoder for `config`
pub fn load_encoder(config: &ModelConfig) -> EmbeddingResult<Arc<dyn SentenceEncoder>> {
    config.validate()?;

    #[cfg(feature = "onnx")]
    {
        let encoder: Arc<dyn SentenceEncoder> = Arc::new(onnx::OnnxSentenceEncoder::load(config)?);
        Ok(encoder)
    }

    #[cfg(not(feature = "onnx"))]
    {
        Err(crate::models::EmbeddingError::ConfigError {
            message: "built without the `onnx` feature, no encoder available".to_string(),
        })
    }
}

/// Deterministic encoders for tests
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::models::EmbeddingError;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn test_info(dimension: usize) -> ModelInfo {
        ModelInfo {
            name: "test-encoder".to_string(),
            dimension,
            max_sequence_length: 256,
            pooling_mode: "mean".to_string(),
            model_path: "test/model.onnx".to_string(),
            tokenizer_path: "test/tokenizer.json".to_string(),
        }
    }

    /// Hash-seeded unit vectors, identical for identical sentences
    pub struct FakeEncoder {
        info: ModelInfo,
    }

    impl FakeEncoder {
        pub fn new(dimension: usize) -> Self {
            Self { info: test_info(dimension) }
        }

        pub fn vector_for(&self, sentence: &str) -> Embedding {
            let mut hasher = DefaultHasher::new();
            sentence.hash(&mut hasher);
            let mut state = hasher.finish() | 1;

            let raw: Vec<f32> = (0..self.info.dimension)
                .map(|_| {
                    // xorshift64
                    state ^= state << 13;
                    state ^= state >> 7;
                    state ^= state << 17;
                    (state % 2000) as f32 / 1000.0 - 1.0
                })
                .collect();

            let norm = raw.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-12);
            raw.into_iter().map(|x| x / norm).collect()
        }
    }

    #[async_trait]
    impl SentenceEncoder for FakeEncoder {
        fn info(&self) -> &ModelInfo {
            &self.info
        }

        async fn encode(&self, sentences: &[String]) -> EmbeddingResult<Vec<Embedding>> {
            Ok(sentences.iter().map(|s| self.vector_for(s)).collect())
        }
    }

    /// Always fails, for exercising error paths
    pub struct FailingEncoder {
        info: ModelInfo,
    }

    impl FailingEncoder {
        pub fn new() -> Self {
            Self { info: test_info(384) }
        }
    }

    #[async_trait]
    impl SentenceEncoder for FailingEncoder {
        fn info(&self) -> &ModelInfo {
            &self.info
        }

        async fn encode(&self, _sentences: &[String]) -> EmbeddingResult<Vec<Embedding>> {
            Err(EmbeddingError::EmbeddingFailed {
                error: "forced failure".to_string(),
            })
        }
    }

    /// Drops the last vector, to exercise count checks
    pub struct ShortEncoder {
        inner: FakeEncoder,
    }

    impl ShortEncoder {
        pub fn new() -> Self {
            Self { inner: FakeEncoder::new(384) }
        }
    }

    #[async_trait]
    impl SentenceEncoder for ShortEncoder {
        fn info(&self) -> &ModelInfo {
            self.inner.info()
        }

        async fn encode(&self, sentences: &[String]) -> EmbeddingResult<Vec<Embedding>> {
            let mut vectors = self.inner.encode(sentences).await?;
            vectors.pop();
            Ok(vectors)
        }
    }
}
