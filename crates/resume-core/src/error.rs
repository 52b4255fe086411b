//! Error types for resume document operations
//!
//! These errors are raised before any network traffic happens: bad input,
//! unknown sections, or merge operations that cannot be applied to the
//! fetched document.

use thiserror::Error;

/// Resume document error types.
#[derive(Debug, Error)]
pub enum ResumeError {
    /// One or more input problems, aggregated into a single message
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// A required field was not supplied
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Section key is not part of the resume schema
    #[error("Unknown section: {0}")]
    UnknownSection(String),

    /// Operation is not valid for the given section
    #[error("Unsupported operation '{operation}' for section '{section}'")]
    UnsupportedOperation {
        /// Section key
        section: String,
        /// Requested operation
        operation: String,
    },

    /// Item with the given ID does not exist in the section
    #[error("{noun} with ID '{id}' not found.")]
    ItemNotFound {
        /// Human-readable item noun, e.g. "Skill"
        noun: String,
        /// The requested item ID
        id: String,
    },

    /// The document fetched from the remote service has an unexpected shape
    #[error("Invalid resume document: {0}")]
    InvalidDocument(String),
}

impl ResumeError {
    /// Build a validation error from a single problem.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }

    /// Whether this error came from caller input rather than document state.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::MissingField(_)
                | Self::UnknownSection(_)
                | Self::UnsupportedOperation { .. }
        )
    }
}

/// Result type for resume document operations.
pub type ResumeResult<T> = Result<T, ResumeError>;
