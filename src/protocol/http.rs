//! HTTP REST API Protocol
//!
//! Request and response bodies for the two embedding endpoints:
//! - Request body: {"inputs": ["sentence", ...]}
//! - Feature-extraction response: [[0.1, 0.2, ...], ...]
//! - Semantic Kernel response: {"data": [{"embedding": [0.1, 0.2, ...]}, ...]}

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::Embedding;

/// Message returned for every internal failure
pub const INTERNAL_ERROR_DETAIL: &str = "An error has ocurred";

/// List of sentences to calculate embeddings for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedInputs {
    #[serde(default = "default_inputs")]
    pub inputs: Vec<String>,
}

fn default_inputs() -> Vec<String> {
    vec!["sentence 1".to_string(), "sentence 2".to_string()]
}

impl Default for EmbedInputs {
    fn default() -> Self {
        Self { inputs: default_inputs() }
    }
}

impl EmbedInputs {
    pub fn new(inputs: Vec<String>) -> Self {
        Self { inputs }
    }

    /// Parse and validate a request body.
    ///
    /// The body is always treated as JSON, whatever the request's content type.
    /// Every problem found is reported, with its location inside the body.
    pub fn from_json(body: &[u8]) -> Result<Self, ValidationErrorResponse> {
        if body.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(ValidationErrorResponse::single(ValidationIssue::new(
                vec![Value::from("body")],
                "Field required",
                "missing",
            )));
        }

        let value: Value = serde_json::from_slice(body).map_err(|e| {
            ValidationErrorResponse::single(ValidationIssue::new(
                vec![Value::from("body"), Value::from(e.column())],
                format!("JSON decode error: {}", e),
                "json_invalid",
            ))
        })?;

        let object = value.as_object().ok_or_else(|| {
            ValidationErrorResponse::single(ValidationIssue::new(
                vec![Value::from("body")],
                "Input should be a valid dictionary or object to extract fields from",
                "model_attributes_type",
            ))
        })?;

        let inputs = match object.get("inputs") {
            None => return Ok(Self::default()),
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(ValidationErrorResponse::single(ValidationIssue::new(
                    vec![Value::from("body"), Value::from("inputs")],
                    "Input should be a valid list",
                    "list_type",
                )));
            }
        };

        let mut sentences = Vec::with_capacity(inputs.len());
        let mut issues = Vec::new();
        for (index, item) in inputs.iter().enumerate() {
            match item {
                Value::String(s) => sentences.push(s.clone()),
                _ => issues.push(ValidationIssue::new(
                    vec![Value::from("body"), Value::from("inputs"), Value::from(index)],
                    "Input should be a valid string",
                    "string_type",
                )),
            }
        }

        if !issues.is_empty() {
            return Err(ValidationErrorResponse { detail: issues });
        }

        Ok(Self::new(sentences))
    }
}

/// One embedding in Semantic Kernel format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkEmbeddingVector {
    pub embedding: Embedding,
}

/// List of embeddings in Semantic Kernel format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticKernelResponse {
    pub data: Vec<SkEmbeddingVector>,
}

impl SemanticKernelResponse {
    pub fn from_embeddings(embeddings: Vec<Embedding>) -> Self {
        Self {
            data: embeddings
                .into_iter()
                .map(|embedding| SkEmbeddingVector { embedding })
                .collect(),
        }
    }
}

/// HTTP Error Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpErrorResponse {
    pub detail: String,
}

impl HttpErrorResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self { detail: detail.into() }
    }

    /// The only error the embedding endpoints expose
    pub fn internal_error() -> Self {
        Self::new(INTERNAL_ERROR_DETAIL)
    }

    pub fn not_found() -> Self {
        Self::new("Not Found")
    }

    pub fn method_not_allowed() -> Self {
        Self::new("Method Not Allowed")
    }

    pub fn model_not_ready() -> Self {
        Self::new("Embedding model is not ready")
    }
}

/// A single request validation problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Path to the offending value, e.g. ["body", "inputs", 0]
    pub loc: Vec<Value>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ValidationIssue {
    pub fn new(loc: Vec<Value>, msg: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            loc,
            msg: msg.into(),
            kind: kind.into(),
        }
    }
}

/// Request validation error body (HTTP 422)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrorResponse {
    pub detail: Vec<ValidationIssue>,
}

impl ValidationErrorResponse {
    pub fn single(issue: ValidationIssue) -> Self {
        Self { detail: vec![issue] }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
    pub version: String,
    pub embedding_dimension: usize,
}

impl HealthResponse {
    pub fn healthy(model: impl Into<String>, dimension: usize) -> Self {
        Self {
            status: "healthy".to_string(),
            model: model.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            embedding_dimension: dimension,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inputs_parsing() {
        let parsed = EmbedInputs::from_json(br#"{"inputs": ["a", "b", "c"]}"#).unwrap();
        assert_eq!(parsed.inputs, vec!["a", "b", "c"]);

        let parsed = EmbedInputs::from_json(br#"{"inputs": []}"#).unwrap();
        assert!(parsed.inputs.is_empty());

        // Missing field falls back to the default, unknown fields are ignored
        let parsed = EmbedInputs::from_json(br#"{"other": 1}"#).unwrap();
        assert_eq!(parsed.inputs, vec!["sentence 1", "sentence 2"]);
    }

    #[test]
    fn test_inputs_validation_errors() {
        let err = EmbedInputs::from_json(b"").unwrap_err();
        assert_eq!(err.detail[0].kind, "missing");
        assert_eq!(err.detail[0].loc, vec![json!("body")]);

        let err = EmbedInputs::from_json(b"{not json").unwrap_err();
        assert_eq!(err.detail[0].kind, "json_invalid");

        let err = EmbedInputs::from_json(br#"["a"]"#).unwrap_err();
        assert_eq!(err.detail[0].kind, "model_attributes_type");

        let err = EmbedInputs::from_json(br#"{"inputs": "hello"}"#).unwrap_err();
        assert_eq!(err.detail[0].kind, "list_type");
        assert_eq!(err.detail[0].loc, vec![json!("body"), json!("inputs")]);

        let err = EmbedInputs::from_json(br#"{"inputs": ["ok", 3, null]}"#).unwrap_err();
        assert_eq!(err.detail.len(), 2);
        assert_eq!(err.detail[0].loc, vec![json!("body"), json!("inputs"), json!(1)]);
        assert_eq!(err.detail[1].loc, vec![json!("body"), json!("inputs"), json!(2)]);
        assert!(err.detail.iter().all(|issue| issue.kind == "string_type"));
    }

    #[test]
    fn test_validation_error_serialization() {
        let err = ValidationErrorResponse::single(ValidationIssue::new(
            vec![json!("body"), json!("inputs")],
            "Input should be a valid list",
            "list_type",
        ));

        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"detail": [{"loc": ["body", "inputs"], "msg": "Input should be a valid list", "type": "list_type"}]})
        );
    }

    #[test]
    fn test_semantic_kernel_response_shape() {
        let response = SemanticKernelResponse::from_embeddings(vec![vec![0.5, 0.25], vec![1.0, 0.0]]);

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"data": [{"embedding": [0.5, 0.25]}, {"embedding": [1.0, 0.0]}]})
        );
    }

    #[test]
    fn test_error_response() {
        let err = HttpErrorResponse::internal_error();
        assert_eq!(
            serde_json::to_string(&err).unwrap(),
            r#"{"detail":"An error has ocurred"}"#
        );
    }
}
