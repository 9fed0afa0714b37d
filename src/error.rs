//! Error types for the checklist core.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - A policy/failure split: a rejected protected-section deletion is a
//!   policy rejection the UI should word differently from a store failure
//! - `#[from]` conversions at the storage boundary

use thiserror::Error;

/// Result type alias for checklist operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string. Presentation layers match
/// on the string when choosing how to word a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Policy
    ProtectedSection,

    // Store
    DatabaseError,
    SerializationError,
    StaleRevision,

    // Internal
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::ProtectedSection => "PROTECTED_SECTION",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::SerializationError => "SERIALIZATION_ERROR",
            Self::StaleRevision => "STALE_REVISION",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether this code is a policy rejection rather than a failure.
    ///
    /// Policy rejections leave state untouched and deserve a specific
    /// message; failures are I/O problems the user can only retry.
    #[must_use]
    pub const fn is_policy(&self) -> bool {
        matches!(self, Self::ProtectedSection)
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in checklist operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Cannot delete protected section: {id}")]
    ProtectedSection { id: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::ProtectedSection { .. } => ErrorCode::ProtectedSection,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::Json(_) => ErrorCode::SerializationError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Whether this error is a policy rejection, delegating to the code.
    #[must_use]
    pub const fn is_policy(&self) -> bool {
        self.error_code().is_policy()
    }
}
