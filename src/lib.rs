//! Sentence Embedding Server Library
//!
//! HTTP service exposing all-MiniLM-L6-v2 sentence embeddings in two
//! response formats: plain feature extraction and Semantic Kernel.

pub mod models;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod protocol;
pub mod server;

// Re-exports
pub use models::{Embedding, EmbeddingError, EmbeddingManager, SentenceEncoder};
pub use protocol::{EmbedInputs, SemanticKernelResponse};
pub use server::{start_hyper_http_server, EmbeddingServer, ServerConfig};
