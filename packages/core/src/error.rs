use thiserror::Error;

use crate::storage::StorageError;

/// Errors surfaced by fragment operations.
///
/// Every variant names the offending field or value so the HTTP layer can
/// translate it without re-deriving context.
#[derive(Debug, Error)]
pub enum FragmentError {
    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("fragment {id} not found")]
    NotFound { id: String },

    #[error("content type {actual} does not match fragment type {expected}")]
    TypeMismatch { expected: String, actual: String },

    #[error("unsupported media type requested: {requested}")]
    UnsupportedMediaType { requested: String },

    #[error("failed to convert to {target}: {reason}")]
    Conversion { target: &'static str, reason: String },

    #[error("conversion from {from} to {to} is not in the conversion matrix")]
    UnsupportedConversion { from: &'static str, to: &'static str },

    #[error("data for fragment {id} is missing from storage")]
    DataMissing { id: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl FragmentError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub(crate) fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }
}

pub type Result<T> = std::result::Result<T, FragmentError>;
