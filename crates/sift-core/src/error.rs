//! Error types for the retrieval engine.

use thiserror::Error;

/// Result type alias using SiftError.
pub type Result<T> = std::result::Result<T, SiftError>;

/// Errors that can occur in the retrieval engine.
#[derive(Error, Debug)]
pub enum SiftError {
    /// Invalid argument provided.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// An embedding payload could not be reduced to a typed vector.
    #[error("Invalid embedding: {reason}")]
    InvalidEmbedding { reason: String },

    /// Chunk store error.
    #[error("Store error: {message}")]
    Store { message: String },

    /// Embedding model error.
    #[error("Embedding error: {message}")]
    Embedding { message: String },

    /// Generation model error.
    #[error("Generation error: {message}")]
    Generation { message: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error (unexpected).
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SiftError {
    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an invalid embedding error.
    pub fn invalid_embedding(reason: impl Into<String>) -> Self {
        Self::InvalidEmbedding {
            reason: reason.into(),
        }
    }

    /// Create a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create an embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    /// Create a generation error.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SiftError::store("connection refused");
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_invalid_embedding_display() {
        let err = SiftError::invalid_embedding("dimension mismatch: 3 != 768");
        assert!(err.to_string().contains("dimension mismatch"));
    }
}
