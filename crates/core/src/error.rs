//! Shared error model.

use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by the foundation types themselves.
///
/// Higher layers keep their own error enums and wrap this one when needed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

impl CoreError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
