//! Error types for the document Q&A system

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for docqa operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by ingestion, retrieval and generation
///
/// Every variant is recoverable: the operation that raised it logs it and hands
/// it back to the caller, which decides how to render it.
#[derive(Debug, Error)]
pub enum Error {
    /// File extension is not one of the supported formats
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// A format-specific extractor failed
    #[error("Failed to extract text from '{file_name}': {message}")]
    Extraction { file_name: String, message: String },

    /// Embedding endpoint failure
    #[error("Embedding service error: {0}")]
    Embedding(String),

    /// Persistent collection failure
    #[error("Vector store error: {0}")]
    VectorStore(String),

    /// Cross-encoder failure
    #[error("Re-ranking failed: {0}")]
    Rerank(String),

    /// Chat endpoint failure
    #[error("Answer generation failed: {0}")]
    Generation(String),

    /// Translation endpoint failure
    #[error("Translation failed: {0}")]
    Translation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed client request
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an extraction error
    pub fn extraction(file_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            file_name: file_name.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector store error
    pub fn vector_store(message: impl Into<String>) -> Self {
        Self::VectorStore(message.into())
    }

    /// Create a re-ranking error
    pub fn rerank(message: impl Into<String>) -> Self {
        Self::Rerank(message.into())
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Short machine-readable tag used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Error::UnsupportedFormat(_) => "unsupported_format",
            Error::Extraction { .. } => "extraction_failure",
            Error::Embedding(_) => "embedding_service_failure",
            Error::VectorStore(_) => "vector_store_failure",
            Error::Rerank(_) => "rerank_failure",
            Error::Generation(_) => "generation_failure",
            Error::Translation(_) => "translation_failure",
            Error::Config(_) => "config_error",
            Error::BadRequest(_) => "bad_request",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::Http(_) => "http_error",
            Error::Internal(_) => "internal_error",
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::VectorStore(err.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Internal(format!("Task join error: {}", err))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::UnsupportedFormat(_) | Error::Extraction { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Error::BadRequest(_) | Error::Json(_) | Error::Config(_) => StatusCode::BAD_REQUEST,
            Error::Embedding(_) | Error::Generation(_) | Error::Translation(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Error::Http(_) => StatusCode::BAD_GATEWAY,
            Error::VectorStore(_) | Error::Rerank(_) | Error::Io(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": {
                "type": self.kind(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}
