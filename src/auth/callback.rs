//! Capture of the provider's redirect back to this client.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

use super::error::AuthError;

const MAX_REQUEST_BYTES: usize = 8 * 1024;

/// Query parameters of a redirect from the hosted UI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectParams {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl RedirectParams {
    pub fn from_code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::default()
        }
    }

    pub fn from_url(url: &Url) -> Self {
        Self::from_query(url.query().unwrap_or_default())
    }

    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            let value = Some(value.into_owned()).filter(|v| !v.is_empty());
            match key.as_ref() {
                "code" => params.code = value,
                "error" => params.error = value,
                "error_description" => params.error_description = value,
                _ => {}
            }
        }
        params
    }

    /// Parse user input: a full redirect URL, a bare query string or a bare code.
    pub fn parse_input(input: &str) -> Result<Self, AuthError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AuthError::MissingCode);
        }
        if input.starts_with("http://") || input.starts_with("https://") {
            return Ok(Self::from_url(&Url::parse(input)?));
        }
        if input.starts_with('?') || input.contains("code=") || input.contains("error=") {
            return Ok(Self::from_query(input));
        }
        Ok(Self::from_code(input))
    }

    pub fn has_code(&self) -> bool {
        self.code.is_some()
    }

    /// The authorization code, or the error the provider redirected with.
    pub fn into_code(self) -> Result<String, AuthError> {
        if let Some(error) = self.error {
            return Err(AuthError::AccessDenied(
                self.error_description.unwrap_or(error),
            ));
        }
        self.code.ok_or(AuthError::MissingCode)
    }
}

/// Loopback HTTP listener for the redirect URI.
#[derive(Debug, Clone)]
pub struct LoopbackListener {
    addr: SocketAddr,
    path: String,
    timeout: Duration,
}

impl LoopbackListener {
    /// Derive the bind address and callback path from a loopback redirect URI.
    pub fn from_redirect_uri(redirect_uri: &str, timeout: Duration) -> Result<Self, AuthError> {
        let url = Url::parse(redirect_uri)?;
        if url.scheme() != "http" {
            return Err(AuthError::InvalidRedirect(format!(
                "{redirect_uri} is not a plain http loopback URI"
            )));
        }
        let ip: std::net::IpAddr = match url.host_str() {
            Some("localhost") | Some("127.0.0.1") => [127, 0, 0, 1].into(),
            Some("[::1]") => std::net::Ipv6Addr::LOCALHOST.into(),
            other => {
                return Err(AuthError::InvalidRedirect(format!(
                    "redirect host {} is not a loopback address",
                    other.unwrap_or("<none>")
                )))
            }
        };
        let port = url.port_or_known_default().unwrap_or(80);
        Ok(Self {
            addr: SocketAddr::new(ip, port),
            path: url.path().to_string(),
            timeout,
        })
    }

    /// Bind before sending the user to the hosted UI so the redirect cannot
    /// arrive ahead of the listener.
    pub async fn bind(&self) -> Result<BoundListener, AuthError> {
        let listener = TcpListener::bind(self.addr).await?;
        tracing::debug!(addr = %self.addr, path = %self.path, "waiting for redirect");
        Ok(BoundListener {
            listener,
            path: self.path.clone(),
            timeout: self.timeout,
        })
    }
}

/// A bound loopback listener waiting for exactly one redirect.
pub struct BoundListener {
    listener: TcpListener,
    path: String,
    timeout: Duration,
}

impl BoundListener {
    pub fn local_addr(&self) -> Result<SocketAddr, AuthError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve requests until one hits the callback path, then return its query.
    ///
    /// Requests for other paths (favicon probes and the like) get a 404.
    pub async fn accept_redirect(self) -> Result<RedirectParams, AuthError> {
        let wait = async {
            loop {
                let (mut stream, peer) = self.listener.accept().await?;
                let Some(target) = read_request_target(&mut stream).await? else {
                    continue;
                };
                let url = Url::parse("http://localhost")?.join(&target)?;
                if url.path() != self.path {
                    tracing::debug!(%peer, path = url.path(), "ignoring non-callback request");
                    respond(&mut stream, "404 Not Found", "Not found").await;
                    continue;
                }
                let params = RedirectParams::from_url(&url);
                let body = if params.has_code() {
                    "Login complete. You can close this window and return to the terminal."
                } else {
                    "Login failed. Return to the terminal for details."
                };
                respond(&mut stream, "200 OK", body).await;
                return Ok::<_, AuthError>(params);
            }
        };
        match tokio::time::timeout(self.timeout, wait).await {
            Ok(result) => result,
            Err(_) => Err(AuthError::MissingCode),
        }
    }
}

async fn read_request_target(stream: &mut TcpStream) -> Result<Option<String>, AuthError> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") || buf.len() >= MAX_REQUEST_BYTES {
            break;
        }
    }
    let request = String::from_utf8_lossy(&buf);
    let mut parts = request.lines().next().unwrap_or_default().split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("GET"), Some(target)) => Ok(Some(target.to_string())),
        _ => Ok(None),
    }
}

async fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let html = format!("<!doctype html><html><body><p>{body}</p></body></html>");
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{html}",
        html.len()
    );
    if let Err(err) = stream.write_all(response.as_bytes()).await {
        tracing::debug!(error = %err, "failed to answer redirect request");
    }
    let _ = stream.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_input_accepts_full_redirect_url() {
        let params =
            RedirectParams::parse_input("http://localhost:8765/callback?code=abc&state=x").unwrap();
        assert_eq!(params.code.as_deref(), Some("abc"));
    }

    #[test]
    fn parse_input_accepts_bare_code() {
        let params = RedirectParams::parse_input("  abc-123 \n").unwrap();
        assert_eq!(params.code.as_deref(), Some("abc-123"));
    }

    #[test]
    fn parse_input_rejects_empty() {
        assert!(matches!(
            RedirectParams::parse_input("   "),
            Err(AuthError::MissingCode)
        ));
    }

    #[test]
    fn provider_error_becomes_access_denied() {
        let params = RedirectParams::from_query("?error=access_denied&error_description=User+cancelled");
        match params.into_code() {
            Err(AuthError::AccessDenied(msg)) => assert_eq!(msg, "User cancelled"),
            other => panic!("expected AccessDenied, got {other:?}"),
        }
    }

    #[test]
    fn empty_code_parameter_is_missing() {
        let params = RedirectParams::from_query("code=");
        assert!(!params.has_code());
    }

    #[test]
    fn listener_rejects_non_loopback_redirects() {
        let result =
            LoopbackListener::from_redirect_uri("https://app.example.com/cb", Duration::from_secs(1));
        assert!(matches!(result, Err(AuthError::InvalidRedirect(_))));
    }

    #[tokio::test]
    async fn listener_returns_callback_query_and_skips_other_paths() {
        let listener =
            LoopbackListener::from_redirect_uri("http://127.0.0.1:0/callback", Duration::from_secs(5))
                .unwrap();
        let bound = listener.bind().await.unwrap();
        let addr = bound.local_addr().unwrap();
        let waiter = tokio::spawn(bound.accept_redirect());

        let mut probe = TcpStream::connect(addr).await.unwrap();
        probe
            .write_all(b"GET /favicon.ico HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        let mut answer = String::new();
        probe.read_to_string(&mut answer).await.unwrap();
        assert!(answer.starts_with("HTTP/1.1 404"));

        let mut browser = TcpStream::connect(addr).await.unwrap();
        browser
            .write_all(b"GET /callback?code=xyz HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        let mut answer = String::new();
        browser.read_to_string(&mut answer).await.unwrap();
        assert!(answer.starts_with("HTTP/1.1 200"));

        let params = waiter.await.unwrap().unwrap();
        assert_eq!(params.code.as_deref(), Some("xyz"));
    }

    #[tokio::test]
    async fn listener_times_out_without_redirect() {
        let listener = LoopbackListener::from_redirect_uri(
            "http://127.0.0.1:0/callback",
            Duration::from_millis(50),
        )
        .unwrap();
        let bound = listener.bind().await.unwrap();
        assert!(matches!(
            bound.accept_redirect().await,
            Err(AuthError::MissingCode)
        ));
    }
}
