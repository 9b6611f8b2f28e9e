//! Error types for the RAG system

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::types::response::FileReport;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure category reported by an external model service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// Credential rejected (HTTP 401/403)
    Auth,
    /// Quota exhausted or rate limited (HTTP 429)
    RateLimit,
    /// Request rejected as malformed (HTTP 400/404/422)
    BadRequest,
    /// Upstream failure (HTTP 5xx)
    Server,
    /// Connection, timeout or transport failure
    Network,
    /// Response body could not be understood
    Decode,
}

impl ServiceErrorKind {
    /// Classify an HTTP status returned by the service
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        match status.as_u16() {
            401 | 403 => Self::Auth,
            429 => Self::RateLimit,
            500..=599 => Self::Server,
            _ => Self::BadRequest,
        }
    }

    /// Whether another attempt could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimit | Self::Server | Self::Network)
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "authentication failed",
            Self::RateLimit => "rate limited",
            Self::BadRequest => "request rejected",
            Self::Server => "service unavailable",
            Self::Network => "network failure",
            Self::Decode => "unreadable response",
        }
    }
}

impl std::fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RAG system errors
#[derive(Debug, Error)]
pub enum Error {
    /// Missing credential or unusable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Out-of-range or otherwise invalid user input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unreadable or corrupt file
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// File parsed but contained no extractable text
    #[error("No extractable text in '{0}'")]
    EmptyDocument(String),

    /// Every uploaded file was skipped or empty
    #[error("No text could be extracted from the uploaded PDFs")]
    NoExtractableText { files: Vec<FileReport> },

    /// Embedding service failure
    #[error("Embedding request failed ({kind}): {message}")]
    Embedding {
        kind: ServiceErrorKind,
        message: String,
    },

    /// Chat-completion service failure
    #[error("Completion request failed ({kind}): {message}")]
    Llm {
        kind: ServiceErrorKind,
        message: String,
    },

    /// Query embedded with a different model than the index
    #[error("Index was built with embedding model '{index_model}' but the query uses '{query_model}'; re-process the documents to switch models")]
    EmbeddingModelMismatch {
        index_model: String,
        query_model: String,
    },

    /// Vector index error
    #[error("Vector index error: {0}")]
    VectorIndex(String),

    /// Index build aborted; nothing was committed
    #[error("Index build failed: {source}")]
    IndexBuild {
        #[source]
        source: Box<Error>,
    },

    /// A single question failed; history and index are untouched
    #[error("Question failed: {source}")]
    Query {
        #[source]
        source: Box<Error>,
    },

    /// Operation not allowed in the current session phase
    #[error("Invalid session state: {0}")]
    InvalidState(String),

    /// Session not found
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    /// Live session cap reached
    #[error("Too many active sessions (limit {0}); try again later")]
    SessionLimit(usize),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file syntax error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an embedding error
    pub fn embedding(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self::Embedding {
            kind,
            message: message.into(),
        }
    }

    /// Create an LLM error
    pub fn llm(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self::Llm {
            kind,
            message: message.into(),
        }
    }

    /// Wrap an error as an aborted index build
    pub fn index_build(source: Error) -> Self {
        Self::IndexBuild {
            source: Box::new(source),
        }
    }

    /// Wrap an error as a failed question
    pub fn query(source: Error) -> Self {
        Self::Query {
            source: Box::new(source),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Service failure category, looking through build/query wrappers
    pub fn service_kind(&self) -> Option<ServiceErrorKind> {
        match self {
            Error::Embedding { kind, .. } | Error::Llm { kind, .. } => Some(*kind),
            Error::IndexBuild { source } | Error::Query { source } => source.service_kind(),
            _ => None,
        }
    }

    fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            Error::Config(_) => (StatusCode::BAD_REQUEST, "configuration_error"),
            Error::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            Error::FileParse { .. } => (StatusCode::BAD_REQUEST, "ingestion_error"),
            Error::EmptyDocument(_) => (StatusCode::UNPROCESSABLE_ENTITY, "empty_document"),
            Error::NoExtractableText { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "no_text_extracted"),
            Error::EmbeddingModelMismatch { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error")
            }
            Error::Embedding { kind, .. } | Error::Llm { kind, .. } => {
                (service_status(*kind), "service_error")
            }
            Error::IndexBuild { source } => (
                source.service_kind().map(service_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                "index_build_error",
            ),
            Error::Query { source } => match source.as_ref() {
                Error::EmbeddingModelMismatch { .. } | Error::Validation(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "query_error")
                }
                other => (
                    other.service_kind().map(service_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                    "query_error",
                ),
            },
            Error::VectorIndex(_) => (StatusCode::INTERNAL_SERVER_ERROR, "vector_index_error"),
            Error::InvalidState(_) => (StatusCode::CONFLICT, "invalid_state"),
            Error::SessionNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::SessionLimit(_) => (StatusCode::SERVICE_UNAVAILABLE, "session_limit"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "json_error"),
            Error::Toml(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_file_error"),
            Error::Http(_) => (StatusCode::BAD_GATEWAY, "http_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

fn service_status(kind: ServiceErrorKind) -> StatusCode {
    match kind {
        ServiceErrorKind::RateLimit => StatusCode::TOO_MANY_REQUESTS,
        ServiceErrorKind::Network => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_type();
        let message = self.to_string();

        let body = match &self {
            Error::NoExtractableText { files } => json!({
                "error": {
                    "type": error_type,
                    "message": message,
                    "details": files,
                }
            }),
            _ => json!({
                "error": {
                    "type": error_type,
                    "message": message,
                }
            }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(
            ServiceErrorKind::from_status(reqwest::StatusCode::UNAUTHORIZED),
            ServiceErrorKind::Auth
        );
        assert_eq!(
            ServiceErrorKind::from_status(reqwest::StatusCode::TOO_MANY_REQUESTS),
            ServiceErrorKind::RateLimit
        );
        assert_eq!(
            ServiceErrorKind::from_status(reqwest::StatusCode::BAD_GATEWAY),
            ServiceErrorKind::Server
        );
        assert_eq!(
            ServiceErrorKind::from_status(reqwest::StatusCode::BAD_REQUEST),
            ServiceErrorKind::BadRequest
        );
        assert!(ServiceErrorKind::RateLimit.is_transient());
        assert!(!ServiceErrorKind::Auth.is_transient());
    }

    #[test]
    fn test_service_kind_through_wrappers() {
        let err = Error::index_build(Error::embedding(ServiceErrorKind::RateLimit, "slow down"));
        assert_eq!(err.service_kind(), Some(ServiceErrorKind::RateLimit));
        assert_eq!(err.status_and_type().0, StatusCode::TOO_MANY_REQUESTS);

        let err = Error::query(Error::llm(ServiceErrorKind::Auth, "bad key"));
        assert_eq!(err.status_and_type(), (StatusCode::BAD_GATEWAY, "query_error"));
    }

    #[test]
    fn test_config_error_status() {
        let err = Error::Config("missing key".into());
        assert_eq!(err.status_and_type().0, StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("missing key"));
    }
}
