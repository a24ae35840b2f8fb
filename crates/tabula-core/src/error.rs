//! Error types for Tabula

use thiserror::Error;

/// Core error type for schema management operations
///
/// `NotFound` and `AlreadyExists` are kept apart so callers can build
/// drop-then-create fixtures without inspecting messages.
#[derive(Error, Debug)]
pub enum TabulaError {
    #[error("Unsupported operation: {operation} is not supported by the {platform} platform")]
    UnsupportedOperation {
        platform: String,
        operation: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Referential error: {0}")]
    Referential(String),

    #[error("Transport error: {0}")]
    Transport(String),

    /// A catalog row set that does not have the shape the normalizer expects
    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TabulaError {
    /// Build an `UnsupportedOperation` error for a platform/operation pair
    pub fn unsupported(platform: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            platform: platform.into(),
            operation: operation.into(),
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedOperation { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    pub fn is_referential(&self) -> bool {
        matches!(self, Self::Referential(_))
    }
}

/// Result type alias for Tabula operations
pub type Result<T> = std::result::Result<T, TabulaError>;

/// Helpers for the idempotent fixture pattern
pub trait ResultExt<T> {
    /// Turn a `NotFound` failure into `Ok(None)`, passing every other error through
    fn ignore_not_found(self) -> Result<Option<T>>;

    /// Turn an `AlreadyExists` failure into `Ok(None)`, passing every other error through
    fn ignore_already_exists(self) -> Result<Option<T>>;
}

impl<T> ResultExt<T> for Result<T> {
    fn ignore_not_found(self) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => {
                tracing::debug!(error = %e, "ignoring missing object");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn ignore_already_exists(self) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_already_exists() => {
                tracing::debug!(error = %e, "ignoring existing object");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
