//! CLI auth command handlers for login, status, and logout.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use url::Url;

use super::{Context, NO_BROWSER_ENV};
use crate::auth::{AuthError, LoopbackListener, RedirectParams, RedirectSource, TokenSet};
use crate::config::DEFAULT_LOGIN_WAIT;
use crate::error::Result;

/// Sends the user to the hosted UI in a browser and waits for the redirect
/// on the loopback redirect URI, falling back to a pasted URL or code.
pub struct BrowserRedirect {
    listener: Option<LoopbackListener>,
    open_browser: bool,
}

impl BrowserRedirect {
    pub fn new(redirect_uri: &str) -> Self {
        let listener = match LoopbackListener::from_redirect_uri(redirect_uri, DEFAULT_LOGIN_WAIT) {
            Ok(listener) => Some(listener),
            Err(err) => {
                tracing::info!(error = %err, "redirect URI is not capturable, will ask for the code");
                None
            }
        };
        Self {
            listener,
            open_browser: std::env::var_os(NO_BROWSER_ENV).is_none(),
        }
    }
}

#[async_trait]
impl RedirectSource for BrowserRedirect {
    async fn redirect(&self, login_url: &Url) -> std::result::Result<RedirectParams, AuthError> {
        let bound = match &self.listener {
            Some(listener) => match listener.bind().await {
                Ok(bound) => Some(bound),
                Err(err) => {
                    tracing::warn!(error = %err, "could not listen for the redirect");
                    None
                }
            },
            None => None,
        };

        println!("Log in at:");
        println!("  {login_url}");
        if self.open_browser {
            if let Err(err) = open::that(login_url.as_str()) {
                tracing::warn!(error = %err, "could not open a browser");
            }
        }

        if let Some(bound) = bound {
            println!("Waiting for the login to complete...");
            match bound.accept_redirect().await {
                Ok(params) => return Ok(params),
                Err(AuthError::MissingCode) => {
                    println!("No redirect received.");
                }
                Err(err) => return Err(err),
            }
        }
        prompt_for_redirect().await
    }
}

/// A redirect supplied up front (`login --code`).
pub struct PastedRedirect(pub RedirectParams);

#[async_trait]
impl RedirectSource for PastedRedirect {
    async fn redirect(&self, _login_url: &Url) -> std::result::Result<RedirectParams, AuthError> {
        Ok(self.0.clone())
    }
}

async fn prompt_for_redirect() -> std::result::Result<RedirectParams, AuthError> {
    println!("Paste the redirect URL (or just the code):");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    RedirectParams::parse_input(&line)
}

/// Log in unless a usable token is cached.
pub async fn authenticate(ctx: &Context) -> Result<TokenSet> {
    let source = BrowserRedirect::new(&ctx.config.redirect_uri);
    Ok(ctx.flow.login(&source).await?)
}

/// Handle `todo-oidc login`.
pub async fn handle_login(ctx: &Context, code: Option<&str>) -> Result<()> {
    if ctx.session.is_logged_in() {
        println!("Already logged in. Run `todo-oidc logout` to switch accounts.");
        return Ok(());
    }
    let tokens = match code {
        Some(input) => {
            let source = PastedRedirect(RedirectParams::parse_input(input)?);
            ctx.flow.login(&source).await?
        }
        None => authenticate(ctx).await?,
    };
    println!("Logged in.");
    if let Some(expires_at) = tokens.expires_at() {
        println!("  Token expires {}", expires_at.format("%Y-%m-%d %H:%M UTC"));
    }
    Ok(())
}

/// Handle `todo-oidc logout`.
pub fn handle_logout(ctx: &Context) -> Result<()> {
    let logout_url = ctx.flow.logout()?;
    println!("Local token removed.");
    println!("Finish logging out at:");
    println!("  {logout_url}");
    if std::env::var_os(NO_BROWSER_ENV).is_none() {
        if let Err(err) = open::that(logout_url.as_str()) {
            tracing::warn!(error = %err, "could not open a browser");
        }
    }
    Ok(())
}

/// Handle `todo-oidc status`.
pub fn handle_status(ctx: &Context) -> Result<()> {
    println!("Token store: {}", ctx.config.token_store().path().display());
    let Some(tokens) = ctx.session.get() else {
        println!("Not logged in");
        return Ok(());
    };
    let now = chrono::Utc::now();
    let state = match tokens.expires_at() {
        Some(expires_at) if tokens.is_expired(now) => {
            format!("expired {}", expires_at.format("%Y-%m-%d %H:%M UTC"))
        }
        Some(expires_at) => format!("valid until {}", expires_at.format("%Y-%m-%d %H:%M UTC")),
        None => "expiry unknown".to_string(),
    };
    println!("Logged in ({} token, {state})", tokens.token_type);
    println!(
        "  Refresh token: {}",
        if tokens.refresh_token.is_some() { "yes" } else { "no" }
    );
    Ok(())
}
