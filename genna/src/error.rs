//! Unified error types for the dialog engine.
//!
//! All engine-facing failures funnel into [`EngineError`]. Per-concern
//! errors (validation, state storage, collaborator calls) have their own
//! enums and convert into the main type via `#[from]`.

// ============================================================================
// Main Error Type
// ============================================================================

/// The main error type for dialog engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A directive referenced a dialog id that is not registered.
    #[error("unknown dialog: {0}")]
    UnknownDialog(String),

    /// A step index past the end of the waterfall was requested.
    #[error("dialog '{dialog}' has no step {index}")]
    StepOutOfRange {
        /// Dialog id.
        dialog: String,
        /// Requested step index.
        index: usize,
    },

    /// State store failure.
    #[error("store: {0}")]
    Store(#[from] StoreError),

    /// Prompt validation failure that could not be recovered locally.
    #[error("validation: {0}")]
    Validation(#[from] ValidationError),

    /// An external collaborator call failed inside a step.
    #[error("collaborator: {0}")]
    Collaborator(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The turn exceeded the configured deadline.
    #[error("turn timed out after {0:?}")]
    TurnTimeout(std::time::Duration),

    /// A prompt validator was built from an invalid pattern.
    #[error("pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Generic internal error.
    #[error("{0}")]
    Internal(String),
}

impl EngineError {
    /// Wrap an external collaborator failure.
    #[inline]
    pub fn collaborator(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Collaborator(Box::new(err))
    }

    /// Create an internal error.
    #[inline]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// ============================================================================
// Validation Errors
// ============================================================================

/// Error produced when user input fails a prompt's check.
///
/// Recovered locally by the turn runner according to the owning dialog's
/// invalid-input policy; it only escapes as an [`EngineError`] when no
/// policy applies.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    /// Free-text input did not match the expected format.
    #[error("{message}")]
    Format {
        /// Corrective message shown to the user.
        message: String,
    },

    /// Input matched none of the offered choice labels.
    #[error("'{input}' is not one of the offered choices")]
    NotAChoice {
        /// The raw user input.
        input: String,
    },
}

/// Result type for prompt validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

// ============================================================================
// State Store Errors
// ============================================================================

/// Error type for conversation/profile store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// Entry not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl StoreError {
    /// Create a not found error.
    #[inline]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound(key.into())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================================
// Collaborator Errors
// ============================================================================

/// Error type for external collaborator calls (REST, knowledge base,
/// recognizer, transcript store).
#[derive(Debug, thiserror::Error)]
pub enum CollabError {
    /// Transport-level failure.
    #[error("transport: {0}")]
    Transport(String),

    /// The collaborator answered with an unexpected payload.
    #[error("decode: {0}")]
    Decode(String),

    /// The collaborator rejected the request.
    #[error("rejected: {0}")]
    Rejected(String),

    /// IO error (file-backed collaborators).
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl CollabError {
    /// Create a transport error.
    #[inline]
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a decode error.
    #[inline]
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}

/// Result type for collaborator calls.
pub type CollabResult<T> = Result<T, CollabError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversions() {
        let store_err = StoreError::not_found("conv:1");
        let engine_err: EngineError = store_err.into();
        assert!(matches!(engine_err, EngineError::Store(_)));

        let validation_err = ValidationError::NotAChoice {
            input: "Maybe".into(),
        };
        let engine_err: EngineError = validation_err.into();
        assert!(matches!(engine_err, EngineError::Validation(_)));
    }

    #[test]
    fn test_collaborator_wrapping() {
        let err = EngineError::collaborator(CollabError::transport("connection refused"));
        assert!(matches!(err, EngineError::Collaborator(_)));
        assert!(err.to_string().contains("connection refused"));
    }
}
