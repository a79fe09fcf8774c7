use thiserror::Error;

use crate::error::{ApiError, RefreshError};

/// Errors raised by credential storage.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::ser::Error> for AuthError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        ApiError::Authentication(error.to_string())
    }
}

impl From<AuthError> for RefreshError {
    fn from(error: AuthError) -> Self {
        RefreshError::Store(error.to_string())
    }
}
