use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Seconds before the provider's expiry at which a token set counts as expired.
pub const EXPIRY_GRACE_SECS: i64 = 60;

/// OAuth token set as issued by the provider's token endpoint.
///
/// # Example
/// ```no_run
/// use todo_oidc::auth::TokenSet;
///
/// let tokens: TokenSet = serde_json::from_str(r#"{
///     "access_token": "access",
///     "id_token": "id",
///     "refresh_token": "refresh",
///     "expires_in": 3600,
///     "token_type": "Bearer"
/// }"#)?;
/// assert!(tokens.has_access_token());
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// When this client received the set. Not part of the provider payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obtained_at: Option<DateTime<Utc>>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl TokenSet {
    pub fn has_access_token(&self) -> bool {
        !self.access_token.trim().is_empty()
    }

    /// Stamp the receive time, used to derive [`TokenSet::expires_at`].
    pub fn stamped(mut self, now: DateTime<Utc>) -> Self {
        self.obtained_at = Some(now);
        self
    }

    /// Absolute expiry, when both the receive time and `expires_in` are known.
    ///
    /// An `expires_in` too large to represent counts as unknown.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        if self.expires_in <= 0 {
            return None;
        }
        let lifetime = Duration::try_seconds(self.expires_in)?;
        self.obtained_at?.checked_add_signed(lifetime)
    }

    /// Sets without a known expiry are never considered expired here;
    /// the API's 401 stays authoritative for them.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let Some(expires_at) = self.expires_at() else {
            return false;
        };
        match expires_at.checked_sub_signed(Duration::seconds(EXPIRY_GRACE_SECS)) {
            Some(deadline) => now >= deadline,
            None => true,
        }
    }
}
