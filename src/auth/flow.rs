use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use url::Url;

use super::callback::RedirectParams;
use super::error::AuthError;
use super::hosted_ui::HostedUi;
use super::session::Session;
use super::token::TokenSet;

/// What the flow does for a given (cached token, redirect) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowDecision {
    /// A cached set with an access token exists; use it.
    UseCached,
    /// No usable cache but the redirect carries a code.
    ExchangeCode(String),
    /// Neither; send the user to the hosted login page.
    RedirectToLogin,
}

/// Pick the action for a start-up state. The first matching rule wins, so a
/// cached token shadows any code in the redirect.
pub fn decide(
    cached: Option<&TokenSet>,
    redirect: Option<&RedirectParams>,
) -> Result<FlowDecision, AuthError> {
    if cached.is_some_and(TokenSet::has_access_token) {
        return Ok(FlowDecision::UseCached);
    }
    match redirect {
        Some(params) if params.has_code() || params.error.is_some() => {
            Ok(FlowDecision::ExchangeCode(params.clone().into_code()?))
        }
        _ => Ok(FlowDecision::RedirectToLogin),
    }
}

/// Where an authenticated token set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Cached,
    Refreshed,
    Exchanged,
}

/// Result of [`AuthFlow::resolve`].
#[derive(Debug, Clone)]
pub enum FlowOutcome {
    Authenticated { tokens: TokenSet, source: TokenSource },
    /// The caller must send the user to `login_url` and come back with the redirect.
    LoginRequired { login_url: Url },
}

/// Sends the user to the hosted login page and returns the redirect.
#[async_trait]
pub trait RedirectSource: Send + Sync {
    async fn redirect(&self, login_url: &Url) -> Result<RedirectParams, AuthError>;
}

/// Authorization-code flow over a [`Session`].
///
/// Returns typed outcomes only; opening browsers and printing belong to the
/// caller.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use todo_oidc::auth::{AuthFlow, FileTokenStore, FlowOutcome, HostedUi, HostedUiConfig, Session};
///
/// # async fn example() -> Result<(), todo_oidc::auth::AuthError> {
/// let ui = HostedUi::new(HostedUiConfig {
///     domain: "https://example.auth.us-east-1.amazoncognito.com".parse()?,
///     client_id: "client".to_string(),
///     redirect_uri: "http://localhost:8765/callback".to_string(),
///     logout_uri: "http://localhost:8765/callback".to_string(),
///     scopes: vec!["openid".to_string()],
/// });
/// let session = Arc::new(Session::new(Arc::new(FileTokenStore::new_default())));
/// let flow = AuthFlow::new(ui, session);
/// if let FlowOutcome::LoginRequired { login_url } = flow.resolve(None).await? {
///     println!("visit {login_url}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct AuthFlow {
    ui: HostedUi,
    session: Arc<Session>,
    silent_refresh: bool,
}

impl AuthFlow {
    pub fn new(ui: HostedUi, session: Arc<Session>) -> Self {
        Self {
            ui,
            session,
            silent_refresh: true,
        }
    }

    pub fn with_silent_refresh(mut self, enabled: bool) -> Self {
        self.silent_refresh = enabled;
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn hosted_ui(&self) -> &HostedUi {
        &self.ui
    }

    /// Run the start-up decision table for an optional redirect.
    pub async fn resolve(&self, redirect: Option<RedirectParams>) -> Result<FlowOutcome, AuthError> {
        let cached = self.session.get();
        match decide(cached.as_ref(), redirect.as_ref())? {
            FlowDecision::UseCached => {
                let Some(tokens) = cached else {
                    return Ok(self.login_required());
                };
                self.use_cached(tokens).await
            }
            FlowDecision::ExchangeCode(code) => {
                tracing::info!("exchanging authorization code");
                let tokens = match self.ui.exchange_code(&code).await {
                    Ok(tokens) => tokens,
                    Err(err) => {
                        tracing::error!(error = %err, "authorization code exchange failed");
                        return Err(err);
                    }
                };
                self.session.set(tokens.clone())?;
                Ok(FlowOutcome::Authenticated {
                    tokens,
                    source: TokenSource::Exchanged,
                })
            }
            FlowDecision::RedirectToLogin => {
                tracing::info!("no cached token and no code, login required");
                Ok(self.login_required())
            }
        }
    }

    /// Resolve, going through the hosted login page when needed.
    pub async fn login(&self, source: &dyn RedirectSource) -> Result<TokenSet, AuthError> {
        let login_url = match self.resolve(None).await? {
            FlowOutcome::Authenticated { tokens, .. } => return Ok(tokens),
            FlowOutcome::LoginRequired { login_url } => login_url,
        };
        let params = source.redirect(&login_url).await?;
        match self.resolve(Some(params)).await? {
            FlowOutcome::Authenticated { tokens, .. } => Ok(tokens),
            FlowOutcome::LoginRequired { .. } => Err(AuthError::MissingCode),
        }
    }

    /// Clear the session and return the hosted logout URL.
    pub fn logout(&self) -> Result<Url, AuthError> {
        let previous = self.session.clear()?;
        let hint = previous.as_ref().and_then(|tokens| tokens.id_token.as_deref());
        Ok(self.ui.logout_url(hint))
    }

    async fn use_cached(&self, tokens: TokenSet) -> Result<FlowOutcome, AuthError> {
        if !self.silent_refresh || !tokens.is_expired(Utc::now()) {
            return Ok(FlowOutcome::Authenticated {
                tokens,
                source: TokenSource::Cached,
            });
        }
        let Some(refresh_token) = tokens.refresh_token.as_deref() else {
            tracing::debug!("cached token expired without refresh token, using as-is");
            return Ok(FlowOutcome::Authenticated {
                tokens,
                source: TokenSource::Cached,
            });
        };
        match self.ui.refresh(refresh_token).await {
            Ok(refreshed) => {
                tracing::info!("refreshed expired token");
                self.session.set(refreshed.clone())?;
                Ok(FlowOutcome::Authenticated {
                    tokens: refreshed,
                    source: TokenSource::Refreshed,
                })
            }
            Err(err) => {
                tracing::warn!(error = %err, "token refresh failed, login required");
                self.session.clear()?;
                Ok(self.login_required())
            }
        }
    }

    fn login_required(&self) -> FlowOutcome {
        FlowOutcome::LoginRequired {
            login_url: self.ui.login_url(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(access: &str) -> TokenSet {
        TokenSet {
            access_token: access.to_string(),
            id_token: None,
            refresh_token: None,
            expires_in: 3600,
            token_type: "Bearer".to_string(),
            obtained_at: None,
        }
    }

    #[test]
    fn cached_token_wins_over_code() {
        let cached = tokens("a");
        let redirect = RedirectParams::from_code("code");
        assert_eq!(
            decide(Some(&cached), Some(&redirect)).unwrap(),
            FlowDecision::UseCached
        );
    }

    #[test]
    fn code_without_cache_is_exchanged() {
        let redirect = RedirectParams::from_code("code-1");
        assert_eq!(
            decide(None, Some(&redirect)).unwrap(),
            FlowDecision::ExchangeCode("code-1".to_string())
        );
    }

    #[test]
    fn cache_without_access_token_falls_through() {
        let cached = tokens("");
        assert_eq!(
            decide(Some(&cached), None).unwrap(),
            FlowDecision::RedirectToLogin
        );
    }

    #[test]
    fn nothing_means_login() {
        assert_eq!(decide(None, None).unwrap(), FlowDecision::RedirectToLogin);
        assert_eq!(
            decide(None, Some(&RedirectParams::default())).unwrap(),
            FlowDecision::RedirectToLogin
        );
    }

    #[test]
    fn provider_error_without_cache_is_denied() {
        let redirect = RedirectParams::from_query("error=access_denied");
        assert!(matches!(
            decide(None, Some(&redirect)),
            Err(AuthError::AccessDenied(_))
        ));
    }
}
