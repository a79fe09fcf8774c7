//! Error classification and recovery hints for the presentation layer.

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    Network,
    Timeout,
    Server,
    Api,
    Configuration,
    Serialization,
    Unknown,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    /// Show the server message as a transient notification.
    ShowMessage,
    RetryLater,
    SignInAgain,
    CheckConfiguration,
    IncreaseTimeout,
    ContactSupport,
}
