//! Error types for the todo client.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

use crate::auth::AuthError;

/// Primary error type for all client operations.
#[derive(Error, Debug)]
pub enum TodoError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing configuration '{key}'")]
    MissingConfiguration { key: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Session expired, please log in again")]
    SessionExpired,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(#[from] AuthError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Todo not found: {0}")]
    NotFound(String),
}

impl TodoError {
    /// Create an API error from a non-success status.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::SessionExpired => ErrorCategory::SessionExpired,
            Self::Authentication(AuthError::NotLoggedIn) => ErrorCategory::SessionExpired,
            Self::Authentication(AuthError::Network(_)) => ErrorCategory::Network,
            Self::Authentication(AuthError::Io(_) | AuthError::Serialization(_)) => {
                ErrorCategory::TokenStore
            }
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::Network(_) => ErrorCategory::Network,
            Self::Configuration(_) | Self::MissingConfiguration { .. } => {
                ErrorCategory::Configuration
            }
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                401 => ErrorCategory::SessionExpired,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::InvalidArgument(_) | Self::NotFound(_) => ErrorCategory::InvalidInput,
            Self::Io(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether the caller has to log in again before continuing.
    pub fn requires_login(&self) -> bool {
        self.category() == ErrorCategory::SessionExpired
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::SessionExpired => RecoverySuggestion::LogIn,
            ErrorCategory::Authentication => RecoverySuggestion::LogIn,
            ErrorCategory::TokenStore => RecoverySuggestion::LogIn,
            ErrorCategory::Network | ErrorCategory::Server => RecoverySuggestion::TryAgainLater,
            ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
            ErrorCategory::InvalidInput => RecoverySuggestion::FixInput,
            _ => RecoverySuggestion::None,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, TodoError>;
