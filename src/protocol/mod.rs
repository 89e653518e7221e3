//! Wire types for the HTTP API

pub mod http;

pub use http::{
    EmbedInputs, HealthResponse, HttpErrorResponse, SemanticKernelResponse, SkEmbeddingVector,
    ValidationErrorResponse, ValidationIssue, INTERNAL_ERROR_DETAIL,
};
