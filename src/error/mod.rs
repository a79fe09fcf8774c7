//! Error types for Ignite.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use reqwest::StatusCode;
use thiserror::Error;

/// Primary error type for all Ignite operations.
///
/// The type is `Clone` so a single refresh failure can be handed to every
/// request that was waiting on it.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// The server answered with a structured error body carrying a message.
    #[error("{message}")]
    Domain { status: u16, message: String },

    /// A non-2xx response that has not been translated into a domain error.
    #[error("HTTP error (status {status})")]
    Http {
        status: u16,
        body: Option<serde_json::Value>,
    },

    #[error("Token refresh failed: {0}")]
    Refresh(#[from] RefreshError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Why a token refresh cycle did not produce a usable credential pair.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("refresh endpoint rejected the request (status {status})")]
    Rejected {
        status: u16,
        message: Option<String>,
    },

    #[error("refresh request failed: {0}")]
    Network(String),

    #[error("invalid refresh response: {0}")]
    InvalidResponse(String),

    #[error("could not persist refreshed credentials: {0}")]
    Store(String),

    #[error("refresh was abandoned before it settled")]
    Abandoned,
}

impl ApiError {
    /// Build the raw error for a non-2xx response.
    pub fn http(status: StatusCode, body: Option<serde_json::Value>) -> Self {
        Self::Http {
            status: status.as_u16(),
            body,
        }
    }

    /// Create a domain error.
    pub fn domain(status: u16, message: impl Into<String>) -> Self {
        Self::Domain {
            status,
            message: message.into(),
        }
    }

    /// HTTP status attached to this error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Domain { status, .. } | Self::Http { status, .. } => Some(*status),
            Self::Refresh(RefreshError::Rejected { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// The `message` field of the server's error body.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Domain { message, .. } => Some(message),
            Self::Http { body, .. } => body
                .as_ref()
                .and_then(|b| b.get("message"))
                .and_then(|m| m.as_str()),
            Self::Refresh(RefreshError::Rejected { message, .. }) => message.as_deref(),
            _ => None,
        }
    }

    /// Translate a raw HTTP failure into a domain error when the body
    /// carries a message; every other error is returned unchanged.
    pub fn into_domain(self) -> Self {
        match self {
            Self::Http { status, body } => {
                match body
                    .as_ref()
                    .and_then(|b| b.get("message"))
                    .and_then(|m| m.as_str())
                {
                    Some(message) => Self::Domain {
                        status,
                        message: message.to_string(),
                    },
                    None => Self::Http { status, body },
                }
            }
            other => other,
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) | Self::Refresh(_) => ErrorCategory::Authentication,
            Self::Network(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::InvalidRequest(_) => ErrorCategory::Api,
            Self::Domain { status, .. } | Self::Http { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
        }
    }

    /// Whether this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Network | ErrorCategory::Timeout | ErrorCategory::Server
        )
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Authentication => RecoverySuggestion::SignInAgain,
            ErrorCategory::Network | ErrorCategory::Server => RecoverySuggestion::RetryLater,
            ErrorCategory::Timeout => RecoverySuggestion::IncreaseTimeout,
            ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
            ErrorCategory::Api => RecoverySuggestion::ShowMessage,
            _ => RecoverySuggestion::ContactSupport,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else if error.is_builder() {
            Self::InvalidRequest(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ApiError>;
