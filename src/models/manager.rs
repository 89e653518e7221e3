//! Embedding Manager
//!
//! Runs the shared encoder over a request's sentences and reshapes the output
//! into the response contracts of the two embedding endpoints.

use std::sync::Arc;
use tracing::debug;

use crate::models::{Embedding, EmbeddingError, EmbeddingResult, ModelInfo, SentenceEncoder};
use crate::protocol::http::{EmbedInputs, SemanticKernelResponse};

/// Front end over the process-wide encoder
#[derive(Clone)]
pub struct EmbeddingManager {
    encoder: Arc<dyn SentenceEncoder>,
}

impl EmbeddingManager {
    pub fn new(encoder: Arc<dyn SentenceEncoder>) -> Self {
        Self { encoder }
    }

    /// Information about the loaded model
    pub fn model_info(&self) -> &ModelInfo {
        self.encoder.info()
    }

    /// One vector per input sentence, in input order
    pub async fn generate_embeddings(&self, inputs: &EmbedInputs) -> EmbeddingResult<Vec<Embedding>> {
        debug!("Receiving input sentences");
        let vectors = self.encode(&inputs.inputs).await?;
        debug!("Returning embedding vectors");
        Ok(vectors)
    }

    /// Same vectors as [`generate_embeddings`](Self::generate_embeddings),
    /// wrapped as `{"data": [{"embedding": [...]}, ...]}`
    pub async fn generate_embeddings_wrapped(
        &self,
        inputs: &EmbedInputs,
    ) -> EmbeddingResult<SemanticKernelResponse> {
        debug!("Receiving input sentences");
        let vectors = self.encode(&inputs.inputs).await?;
        debug!("Returning embedding vectors");
        Ok(SemanticKernelResponse::from_embeddings(vectors))
    }

    /// Encode and check that the encoder kept one vector per sentence
    async fn encode(&self, sentences: &[String]) -> EmbeddingResult<Vec<Embedding>> {
        let vectors = self.encoder.encode(sentences).await?;

        if vectors.len() != sentences.len() {
            return Err(EmbeddingError::EmbeddingFailed {
                error: format!(
                    "Encoder returned {} vectors for {} sentences",
                    vectors.len(),
                    sentences.len()
                ),
            });
        }

        Ok(vectors)
    }
}
