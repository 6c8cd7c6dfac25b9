//! API request and response types.

use serde::{Deserialize, Serialize};

/// Body of an ask request.
///
/// Accepts either `{"question": "..."}` or a bare JSON string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AskRequest {
    Object { question: String },
    Plain(String),
}

impl AskRequest {
    pub fn question(&self) -> &str {
        match self {
            AskRequest::Object { question } => question,
            AskRequest::Plain(question) => question,
        }
    }
}

/// Final answer for an ask request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

/// Result of ingesting a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Number of chunks now held by the retriever
    pub chunks: usize,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

/// Error body returned for failed requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
