//! # ONNX Embedding Engine
//!
//! Pure Rust implementation of embedding generation using ONNX Runtime
//! and the all-MiniLM-L6-v2 model.
//!
//! ## Pipeline
//!
//! - Tokenize with the HuggingFace tokenizer (truncated to the model's
//!   maximum sequence length)
//! - Run the transformer, read `last_hidden_state`
//! - Mean pooling over tokens, weighted by the attention mask
//! - L2 normalization
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = OnnxEmbeddingEngine::new("model.onnx", "tokenizer.json", &OnnxConfig::default())?;
//! let embeddings = engine.embed_texts(&["Hello world".to_string()])?;
//! assert_eq!(embeddings[0].len(), 384);
//! ```

use crate::models::{Embedding, EmbeddingError, ModelConfig};
use ndarray::ArrayViewD;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info, instrument};

/// Smallest norm used when normalizing, so zero vectors stay zero
const NORM_EPSILON: f32 = 1e-12;

/// Configuration for ONNX Runtime
#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// Path to ONNX Runtime library (DLL/so/dylib), empty to use the bundled one
    pub library_path: String,
    /// Thread pool size for inference
    pub thread_pool_size: usize,
    /// Maximum sequence length in tokens
    pub max_seq_length: usize,
}

impl Default for OnnxConfig {
    fn default() -> Self {
        Self {
            library_path: String::new(),
            thread_pool_size: 4,
            max_seq_length: 256,
        }
    }
}

impl From<&ModelConfig> for OnnxConfig {
    fn from(config: &ModelConfig) -> Self {
        Self {
            library_path: config.onnx_runtime_path.clone(),
            thread_pool_size: config.num_threads,
            max_seq_length: config.max_sequence_length,
        }
    }
}

/// ONNX-based embedding engine for generating text embeddings
#[derive(Debug)]
pub struct OnnxEmbeddingEngine {
    /// ONNX Runtime session for model inference
    session: Session,
    /// HuggingFace tokenizer for text preprocessing
    tokenizer: Tokenizer,
}

impl OnnxEmbeddingEngine {
    /// Create a new ONNX embedding engine
    ///
    /// # Arguments
    /// * `model_path` - Path to the ONNX model file (model.onnx)
    /// * `tokenizer_path` - Path to the tokenizer configuration file (tokenizer.json)
    /// * `onnx_config` - ONNX Runtime configuration
    pub fn new(
        model_path: &str,
        tokenizer_path: &str,
        onnx_config: &OnnxConfig,
    ) -> Result<Self, EmbeddingError> {
        info!("Initializing ONNX embedding engine with model: {}", model_path);

        if !std::path::Path::new(model_path).exists() {
            return Err(EmbeddingError::ModelLoadFailed {
                error: format!("ONNX model file not found: {}", model_path),
            });
        }

        // Must be set before the first session is built
        if !onnx_config.library_path.is_empty() {
            std::env::set_var("ORT_DYLIB_PATH", &onnx_config.library_path);
            debug!("Set ORT_DYLIB_PATH to: {}", onnx_config.library_path);
        }

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(onnx_config.thread_pool_size)?
            .commit_from_file(model_path)
            .map_err(|e| EmbeddingError::ModelLoadFailed {
                error: format!("Failed to load ONNX model: {}", e),
            })?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| EmbeddingError::ModelLoadFailed {
                error: format!("Failed to load tokenizer: {}", e),
            })?;

        // Padding is never needed, sentences are run one at a time
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: onnx_config.max_seq_length,
                ..Default::default()
            }))
            .map_err(|e| EmbeddingError::ModelLoadFailed {
                error: format!("Failed to configure tokenizer truncation: {}", e),
            })?;

        info!(
            "ONNX embedding engine initialized with {} threads, max sequence length {}",
            onnx_config.thread_pool_size, onnx_config.max_seq_length
        );
        Ok(Self { session, tokenizer })
    }

    /// Generate embeddings for a list of texts
    ///
    /// Returns one L2-normalized vector per input, in input order. Blocks the
    /// calling thread for the duration of inference.
    #[instrument(skip(self, texts), fields(text_count = texts.len()))]
    pub fn embed_texts(&mut self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for text in texts {
            let encoding = self.tokenizer.encode(text.as_str(), true)
                .map_err(|e| EmbeddingError::EmbeddingFailed {
                    error: format!("Tokenization failed: {}", e),
                })?;

            let attention_mask = encoding.get_attention_mask();
            let seq_len = encoding.get_ids().len();

            let input_ids_vec: Vec<i64> = encoding.get_ids().iter().map(|&x| x as i64).collect();
            let attention_mask_vec: Vec<i64> = attention_mask.iter().map(|&x| x as i64).collect();
            let token_type_ids_vec: Vec<i64> = encoding.get_type_ids().iter().map(|&x| x as i64).collect();

            // [batch_size=1, seq_len]
            let input_ids_tensor = Tensor::from_array(([1i64, seq_len as i64], input_ids_vec))
                .map_err(|e| tensor_error("input_ids", e))?;
            let attention_mask_tensor = Tensor::from_array(([1i64, seq_len as i64], attention_mask_vec))
                .map_err(|e| tensor_error("attention_mask", e))?;
            let token_type_ids_tensor = Tensor::from_array(([1i64, seq_len as i64], token_type_ids_vec))
                .map_err(|e| tensor_error("token_type_ids", e))?;

            let outputs = self.session.run(vec![
                ("input_ids", input_ids_tensor),
                ("attention_mask", attention_mask_tensor),
                ("token_type_ids", token_type_ids_tensor),
            ])
            .map_err(|e| EmbeddingError::EmbeddingFailed {
                error: format!("ONNX inference failed: {}", e),
            })?;

            let (shape, data) = outputs["last_hidden_state"]
                .try_extract_tensor::<f32>()
                .map_err(|e| EmbeddingError::EmbeddingFailed {
                    error: format!("Failed to extract output tensor: {}", e),
                })?;

            let dims: Vec<usize> = shape.iter().map(|&x| x as usize).collect();
            let output_array = ndarray::ArrayView::from_shape(dims.as_slice(), data)
                .map_err(|e| EmbeddingError::EmbeddingFailed {
                    error: format!("Failed to create output array view: {:?}", e),
                })?;

            let pooled = mean_pooling(&output_array, attention_mask)?;
            embeddings.push(normalize_embedding(&pooled));
        }

        debug!("Generated {} embeddings", embeddings.len());
        Ok(embeddings)
    }
}

fn tensor_error(name: &str, error: ort::Error) -> EmbeddingError {
    EmbeddingError::EmbeddingFailed {
        error: format!("Failed to create {} tensor: {}", name, error),
    }
}

/// Apply mean pooling to the token embeddings
///
/// `output_tensor` is `[1, seq_len, hidden_size]`; tokens whose attention mask
/// is zero do not contribute.
pub(crate) fn mean_pooling(
    output_tensor: &ArrayViewD<f32>,
    attention_mask: &[u32],
) -> Result<Vec<f32>, EmbeddingError> {
    let shape = output_tensor.shape();
    if shape.len() != 3 {
        return Err(EmbeddingError::EmbeddingFailed {
            error: format!("Expected 3D output tensor, got {}D", shape.len()),
        });
    }

    let seq_len = shape[1];
    let hidden_size = shape[2];

    if attention_mask.len() != seq_len {
        return Err(EmbeddingError::EmbeddingFailed {
            error: format!(
                "Attention mask length {} doesn't match sequence length {}",
                attention_mask.len(),
                seq_len
            ),
        });
    }

    let mut pooled = vec![0.0f32; hidden_size];
    let mut mask_sum = 0.0f32;

    for (seq_idx, &mask) in attention_mask.iter().enumerate() {
        if mask == 0 {
            continue;
        }
        let weight = mask as f32;
        for (hidden_idx, value) in pooled.iter_mut().enumerate() {
            *value += output_tensor[[0, seq_idx, hidden_idx]] * weight;
        }
        mask_sum += weight;
    }

    // Same clamp as sentence-transformers
    let divisor = mask_sum.max(1e-9);
    for value in &mut pooled {
        *value /= divisor;
    }

    Ok(pooled)
}

/// L2-normalize an embedding
pub(crate) fn normalize_embedding(embedding: &[f32]) -> Vec<f32> {
    let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt().max(NORM_EPSILON);
    embedding.iter().map(|x| x / norm).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, IxDyn};

    #[test]
    fn test_mean_pooling_ignores_masked_tokens() {
        // seq_len = 3, hidden = 2; the last token is padding
        let data = vec![1.0, 2.0, 3.0, 4.0, 100.0, 100.0];
        let array = Array3::from_shape_vec((1, 3, 2), data).unwrap().into_dyn();

        let pooled = mean_pooling(&array.view(), &[1, 1, 0]).unwrap();
        assert_eq!(pooled, vec![2.0, 3.0]);
    }

    #[test]
    fn test_mean_pooling_rejects_bad_shapes() {
        let array = ndarray::ArrayD::<f32>::zeros(IxDyn(&[1, 4]));
        assert!(mean_pooling(&array.view(), &[1, 1, 1, 1]).is_err());

        let array = ndarray::ArrayD::<f32>::zeros(IxDyn(&[1, 2, 3]));
        assert!(mean_pooling(&array.view(), &[1]).is_err());
    }

    #[test]
    fn test_normalize_embedding() {
        let normalized = normalize_embedding(&[3.0, 4.0]);
        assert!((normalized[0] - 0.6).abs() < 1e-6);
        assert!((normalized[1] - 0.8).abs() < 1e-6);

        // Zero vectors stay zero instead of producing NaN
        let zeros = normalize_embedding(&[0.0, 0.0, 0.0]);
        assert_eq!(zeros, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_onnx_config_from_model_config() {
        let mut model = ModelConfig::default();
        model.num_threads = 2;
        model.max_sequence_length = 128;

        let config = OnnxConfig::from(&model);
        assert_eq!(config.thread_pool_size, 2);
        assert_eq!(config.max_seq_length, 128);
        assert!(config.library_path.is_empty());
    }

    #[test]
    fn test_missing_model_file() {
        let result = OnnxEmbeddingEngine::new(
            "does/not/exist/model.onnx",
            "does/not/exist/tokenizer.json",
            &OnnxConfig::default(),
        );
        assert!(matches!(result, Err(EmbeddingError::ModelLoadFailed { .. })));
    }
}
