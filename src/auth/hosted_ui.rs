use chrono::Utc;
use serde::Deserialize;
use url::Url;

use super::error::AuthError;
use super::token::TokenSet;

/// Cognito hosted-UI endpoints and client registration.
#[derive(Debug, Clone)]
pub struct HostedUiConfig {
    /// Base URL of the user pool domain, e.g. `https://example.auth.us-east-1.amazoncognito.com`.
    pub domain: Url,
    pub client_id: String,
    pub redirect_uri: String,
    pub logout_uri: String,
    pub scopes: Vec<String>,
}

/// Client for the provider's hosted login/logout pages and token endpoint.
///
/// # Example
/// ```no_run
/// use todo_oidc::auth::{HostedUi, HostedUiConfig};
///
/// let ui = HostedUi::new(HostedUiConfig {
///     domain: "https://example.auth.us-east-1.amazoncognito.com".parse()?,
///     client_id: "client".to_string(),
///     redirect_uri: "http://localhost:8765/callback".to_string(),
///     logout_uri: "http://localhost:8765/callback".to_string(),
///     scopes: vec!["openid".to_string()],
/// });
/// println!("{}", ui.login_url());
/// # Ok::<(), url::ParseError>(())
/// ```
#[derive(Debug, Clone)]
pub struct HostedUi {
    client: reqwest::Client,
    config: HostedUiConfig,
}

impl HostedUi {
    pub fn new(config: HostedUiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn config(&self) -> &HostedUiConfig {
        &self.config
    }

    /// Hosted login page for the authorization-code flow.
    pub fn login_url(&self) -> Url {
        let scope = self.config.scopes.join(" ");
        let mut url = self.endpoint("login");
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &scope);
        url
    }

    /// Hosted logout page, with an id-token hint when one is known.
    pub fn logout_url(&self, id_token_hint: Option<&str>) -> Url {
        let mut url = self.endpoint("logout");
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("client_id", &self.config.client_id)
                .append_pair("logout_uri", &self.config.logout_uri);
            if let Some(hint) = id_token_hint {
                pairs.append_pair("id_token_hint", hint);
            }
        }
        url
    }

    pub fn token_url(&self) -> Url {
        self.endpoint("oauth2/token")
    }

    /// Exchange an authorization code for a token set.
    ///
    /// Any non-success status is reported as [`AuthError::ExchangeFailed`];
    /// invalid, expired and server-side failures are not told apart.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenSet, AuthError> {
        let resp = self
            .client
            .post(self.token_url())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("code", code),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(AuthError::ExchangeFailed {
                status: resp.status().as_u16(),
            });
        }

        let payload: TokenResponse = resp.json().await?;
        payload.into_token_set(None)
    }

    /// Trade a refresh token for a new set.
    ///
    /// Cognito does not rotate refresh tokens, so the old one is carried over
    /// when the response omits it.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, AuthError> {
        let resp = self
            .client
            .post(self.token_url())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.config.client_id.as_str()),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(AuthError::RefreshFailed {
                status: resp.status().as_u16(),
            });
        }

        let payload: TokenResponse = resp.json().await?;
        payload.into_token_set(Some(refresh_token))
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.config.domain.clone();
        let base = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{base}/{path}"));
        url.set_query(None);
        url
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    id_token: Option<String>,
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: i64,
    token_type: Option<String>,
}

impl TokenResponse {
    fn into_token_set(self, fallback_refresh: Option<&str>) -> Result<TokenSet, AuthError> {
        let access_token = self
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                AuthError::InvalidResponse("token response missing access_token".to_string())
            })?;
        Ok(TokenSet {
            access_token,
            id_token: self.id_token,
            refresh_token: self
                .refresh_token
                .or_else(|| fallback_refresh.map(str::to_string)),
            expires_in: self.expires_in,
            token_type: self.token_type.unwrap_or_else(|| "Bearer".to_string()),
            obtained_at: None,
        }
        .stamped(Utc::now()))
    }
}
