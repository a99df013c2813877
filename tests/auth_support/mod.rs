#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use url::Url;

use todo_oidc::auth::{
    AuthError, AuthFlow, HostedUi, HostedUiConfig, RedirectParams, RedirectSource, Session,
    TokenSet, TokenStore,
};

#[derive(Default)]
pub struct InMemoryTokenStore {
    tokens: Mutex<Option<TokenSet>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(tokens: TokenSet) -> Self {
        Self {
            tokens: Mutex::new(Some(tokens)),
        }
    }

    pub fn get(&self) -> Option<TokenSet> {
        self.tokens.lock().expect("store lock poisoned").clone()
    }
}

impl TokenStore for InMemoryTokenStore {
    fn load(&self) -> Result<Option<TokenSet>, AuthError> {
        Ok(self.get())
    }

    fn save(&self, tokens: &TokenSet) -> Result<(), AuthError> {
        *self.tokens.lock().expect("store lock poisoned") = Some(tokens.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.tokens.lock().expect("store lock poisoned") = None;
        Ok(())
    }
}

pub fn token(access_token: &str) -> TokenSet {
    TokenSet {
        access_token: access_token.to_string(),
        id_token: None,
        refresh_token: None,
        expires_in: 3600,
        token_type: "Bearer".to_string(),
        obtained_at: Some(Utc::now()),
    }
}

/// A set obtained at `obtained_at` with a refresh token attached.
pub fn refreshable_token(access_token: &str, obtained_at: DateTime<Utc>) -> TokenSet {
    TokenSet {
        refresh_token: Some("refresh-1".to_string()),
        obtained_at: Some(obtained_at),
        ..token(access_token)
    }
}

pub fn hosted_ui_config(domain: &str) -> HostedUiConfig {
    HostedUiConfig {
        domain: domain.parse().expect("domain url"),
        client_id: "client-123".to_string(),
        redirect_uri: "http://localhost:8765/callback".to_string(),
        logout_uri: "http://localhost:8765/".to_string(),
        scopes: vec!["email".to_string(), "openid".to_string(), "phone".to_string()],
    }
}

pub fn session_with(store: Arc<InMemoryTokenStore>) -> Arc<Session> {
    Arc::new(Session::new(store))
}

pub fn flow_for(domain: &str, store: Arc<InMemoryTokenStore>) -> AuthFlow {
    AuthFlow::new(HostedUi::new(hosted_ui_config(domain)), session_with(store))
}

/// Redirect source that records the login URL it was sent to.
pub struct RecordingRedirect {
    response: Option<RedirectParams>,
    visited: Mutex<Vec<Url>>,
}

impl RecordingRedirect {
    pub fn returning(params: RedirectParams) -> Self {
        Self {
            response: Some(params),
            visited: Mutex::new(Vec::new()),
        }
    }

    /// A source that never comes back with a redirect.
    pub fn abandoned() -> Self {
        Self {
            response: None,
            visited: Mutex::new(Vec::new()),
        }
    }

    pub fn visited(&self) -> Vec<Url> {
        self.visited.lock().expect("visited lock poisoned").clone()
    }
}

#[async_trait]
impl RedirectSource for RecordingRedirect {
    async fn redirect(&self, login_url: &Url) -> Result<RedirectParams, AuthError> {
        self.visited
            .lock()
            .expect("visited lock poisoned")
            .push(login_url.clone());
        self.response.clone().ok_or(AuthError::MissingCode)
    }
}
