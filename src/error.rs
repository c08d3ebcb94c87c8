//! Fault taxonomy shared by the reader and the synchronizer.
//!
//! Operations return `Result<_, ApiError>` internally and convert to a
//! status-bearing response body at their boundary, so no error ever reaches
//! the HTTP layer unconverted.

use crate::db::StoreError;
use crate::translation::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body malformed, wrong field types, or invalid field values.
    /// `reason` is logged but never returned to the caller.
    #[error("invalid input")]
    InvalidInput { reason: String },

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("no info found for language: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Persistence(#[from] StoreError),

    #[error("translation provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// HTTP status code carried in the response body (and mirrored on the
    /// transport).
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput { .. } | Self::MissingField(_) | Self::UnsupportedLanguage(_) => 400,
            Self::NotFound(_) => 404,
            Self::MethodNotAllowed(_) => 405,
            Self::Provider(_) => 502,
            Self::Persistence(_) | Self::Internal(_) => 500,
        }
    }
}
