use thiserror::Error;

/// Errors raised by the login flow, the token endpoint and the token store.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("Authorization denied: {0}")]
    AccessDenied(String),
    #[error("Token exchange failed with status {status}")]
    ExchangeFailed { status: u16 },
    #[error("Token refresh failed with status {status}")]
    RefreshFailed { status: u16 },
    #[error("No authorization code received")]
    MissingCode,
    #[error("Invalid redirect: {0}")]
    InvalidRedirect(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
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

impl From<url::ParseError> for AuthError {
    fn from(error: url::ParseError) -> Self {
        Self::InvalidRedirect(error.to_string())
    }
}
