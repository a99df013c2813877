//! Shared HTTP client construction and response helpers.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};

use crate::error::TodoError;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the reqwest client used for the todo API and the token endpoint.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, TodoError> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(4)
        .build()?)
}

/// Headers for a bearer-authenticated JSON call.
pub fn bearer_headers(access_token: &str) -> Result<HeaderMap, TodoError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    let value = HeaderValue::from_str(&format!("Bearer {access_token}")).map_err(|_| {
        TodoError::InvalidArgument("access token contains invalid header characters".to_string())
    })?;
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}

/// Map a non-success status to an error. 401 always means the session is over.
pub fn status_to_error(status: u16, body: &str) -> TodoError {
    match status {
        401 => TodoError::SessionExpired,
        _ => TodoError::api(status, extract_message(body)),
    }
}

fn extract_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("detail")
                .or_else(|| v.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
