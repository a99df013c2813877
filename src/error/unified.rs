//! Error classification and recovery.

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 401 from the API, or no token at all.
    SessionExpired,
    /// Token endpoint or hosted UI failures.
    Authentication,
    /// Cached token could not be read or parsed.
    TokenStore,
    Network,
    Server,
    Api,
    Configuration,
    Serialization,
    InvalidInput,
    Unknown,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    LogIn,
    TryAgainLater,
    CheckConfiguration,
    FixInput,
    None,
}
