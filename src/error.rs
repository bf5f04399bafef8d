//! Error types for precedence.
//!
//! All errors are strongly typed using thiserror. This enables pattern
//! matching on specific error conditions and keeps collaborator failures
//! (grant sources, upload transports) distinct from local failures.

use thiserror::Error;

/// Validation errors that occur while constructing core types.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Context key cannot be empty")]
    EmptyContextKey,

    #[error("Permission node cannot be empty")]
    EmptyPermissionNode,

    #[error("Metadata key cannot be empty")]
    EmptyMetaKey,

    #[error("Inherited group name cannot be empty")]
    EmptyGroupName,

    #[error("Required field '{field}' is missing")]
    MissingField { field: String },
}

/// Errors reported by a grant source collaborator.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Holder not found: {holder}")]
    HolderNotFound { holder: String },

    #[error("Grant source backend error: {message}")]
    Backend { message: String },
}

/// Errors reported by a content-upload transport collaborator.
///
/// A rejection (the service refused the payload) is deliberately distinct
/// from unavailability (the request never completed).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Upload request rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Upload transport unavailable: {message}")]
    Unavailable { message: String },
}

/// Errors that occur while exporting a diagnostic snapshot.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to serialize snapshot: {message}")]
    Serialize { message: String },

    #[error("Failed to compress snapshot: {0}")]
    Compress(#[from] std::io::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Top-level error type for precedence operations.
#[derive(Debug, Error)]
pub enum PrecedenceError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Grant source error: {0}")]
    Source(#[from] SourceError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PrecedenceError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this error came from a grant source collaborator.
    #[must_use]
    pub const fn is_source(&self) -> bool {
        matches!(self, Self::Source(_))
    }

    /// Returns true if this error came from the export pipeline.
    #[must_use]
    pub const fn is_export(&self) -> bool {
        matches!(self, Self::Export(_))
    }

    /// Returns true if this error is retryable.
    ///
    /// Validation never is; exports are retryable only when the transport
    /// was unavailable (a rejection will not change on retry).
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) | Self::Internal { .. } => false,
            Self::Source(e) => matches!(e, SourceError::Backend { .. }),
            Self::Export(e) => matches!(
                e,
                ExportError::Transport(TransportError::Unavailable { .. })
            ),
        }
    }
}

/// Result type alias for precedence operations.
pub type PrecedenceResult<T> = Result<T, PrecedenceError>;
