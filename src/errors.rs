/// Domain-specific error types for forumsearch
///
/// Input errors carry the offending field so callers can correct the request.
/// Backend errors never escape a retrieval adapter; they are downgraded to an
/// empty candidate list at the adapter boundary.

use crate::document::Modality;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>
    },

    #[error("{modality} backend unavailable: {message}")]
    BackendUnavailable {
        modality: Modality,
        message: String
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Search timed out after {elapsed_ms} ms")]
    Timeout {
        elapsed_ms: u64
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<crate::embedding::EmbeddingError> for SearchError {
    fn from(e: crate::embedding::EmbeddingError) -> Self {
        SearchError::BackendUnavailable {
            modality: Modality::Vector,
            message: e.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for SearchError {
    fn from(e: tokio::task::JoinError) -> Self {
        SearchError::Internal(format!("Blocking task failed: {}", e))
    }
}

impl SearchError {
    /// Helper to create validation errors with field names
    ///
    /// Example:
    /// ```
    /// use forumsearch::errors::SearchError;
    /// let err = SearchError::validation("query", "Query cannot be empty");
    /// assert!(err.is_input_error());
    /// ```
    pub fn validation(field: &str, message: &str) -> Self {
        SearchError::Validation {
            message: message.to_string(),
            field: Some(field.to_string()),
        }
    }

    /// Helper for adapter-side failures.
    pub fn backend(modality: Modality, message: impl Into<String>) -> Self {
        SearchError::BackendUnavailable {
            modality,
            message: message.into(),
        }
    }

    /// True for errors caused by a malformed request rather than the system.
    pub fn is_input_error(&self) -> bool {
        matches!(self, SearchError::Validation { .. })
    }
}
