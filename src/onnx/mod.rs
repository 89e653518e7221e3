//! ONNX Runtime backend for the sentence encoder

pub mod onnx_engine;
pub use onnx_engine::{OnnxConfig, OnnxEmbeddingEngine};
