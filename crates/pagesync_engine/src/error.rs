//! Error types for the fetch engine.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can reach a caller of the engine.
///
/// Reconciliation never errors (unknown input is dropped), a superseded
/// fetch result is discarded silently, and a failed location push falls back
/// to in-memory facet state; none of those conditions appear here.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The injected data source rejected a fetch.
    #[error("source error: {message}")]
    Source {
        /// Error message from the source.
        message: String,
        /// Whether the fetch could be retried by the caller.
        retryable: bool,
    },

    /// An asynchronous filter lookup failed.
    #[error("filter lookup failed: {0}")]
    Lookup(String),
}

impl EngineError {
    /// Creates a retryable source error.
    pub fn source_retryable(message: impl Into<String>) -> Self {
        Self::Source {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable source error.
    pub fn source_fatal(message: impl Into<String>) -> Self {
        Self::Source {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if the operation can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Source { retryable, .. } => *retryable,
            EngineError::Lookup(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(EngineError::source_retryable("timeout").is_retryable());
        assert!(!EngineError::source_fatal("bad request").is_retryable());
        assert!(!EngineError::Lookup("unknown asset".into()).is_retryable());
    }

    #[test]
    fn error_display() {
        let err = EngineError::source_fatal("backend unavailable");
        assert_eq!(err.to_string(), "source error: backend unavailable");
    }
}
