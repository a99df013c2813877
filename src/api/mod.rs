//! Authenticated client for the todo REST endpoint.

pub mod http;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

use crate::error::{Result, TodoError};
use crate::types::{NewTodo, Todo};

/// How a completion toggle reaches the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ToggleMode {
    /// `PUT /todos/{id}` with `completedAt` computed on the client.
    #[default]
    Client,
    /// `PUT /todos/{id}/toggle`; the server flips the flag.
    Server,
}

/// Client for `GET/POST /todos`, `PUT/DELETE /todos/{id}`.
///
/// Every call takes the access token explicitly and sends it as
/// `Authorization: Bearer <token>`.
///
/// # Example
/// ```no_run
/// use todo_oidc::api::TodoClient;
///
/// # async fn example() -> todo_oidc::error::Result<()> {
/// let client = TodoClient::new("https://api.example.com/prod/todos".parse().unwrap());
/// for todo in client.list("access-token").await? {
///     println!("{}", todo.title);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TodoClient {
    client: reqwest::Client,
    endpoint: Url,
    toggle_mode: ToggleMode,
}

impl TodoClient {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            toggle_mode: ToggleMode::default(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_toggle_mode(mut self, mode: ToggleMode) -> Self {
        self.toggle_mode = mode;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub async fn list(&self, access_token: &str) -> Result<Vec<Todo>> {
        tracing::debug!(url = %self.endpoint, "listing todos");
        let resp = self
            .client
            .get(self.endpoint.clone())
            .headers(http::bearer_headers(access_token)?)
            .send()
            .await?;
        read_json(resp).await
    }

    pub async fn create(&self, access_token: &str, new_todo: &NewTodo) -> Result<Todo> {
        tracing::debug!(url = %self.endpoint, "creating todo");
        let resp = self
            .client
            .post(self.endpoint.clone())
            .headers(http::bearer_headers(access_token)?)
            .json(new_todo)
            .send()
            .await?;
        read_json(resp).await
    }

    /// Replace a todo with `todo` (`PUT /todos/{id}`).
    pub async fn update(&self, access_token: &str, todo: &Todo) -> Result<Todo> {
        let url = self.item_url(&todo.id, &[])?;
        tracing::debug!(%url, "updating todo");
        let resp = self
            .client
            .put(url)
            .headers(http::bearer_headers(access_token)?)
            .json(todo)
            .send()
            .await?;
        read_json(resp).await
    }

    /// Flip completion of `todo` according to the configured [`ToggleMode`].
    pub async fn toggle(&self, access_token: &str, todo: &Todo) -> Result<Todo> {
        match self.toggle_mode {
            ToggleMode::Client => self.update(access_token, &todo.toggled(Utc::now())).await,
            ToggleMode::Server => {
                let url = self.item_url(&todo.id, &["toggle"])?;
                tracing::debug!(%url, "toggling todo");
                let resp = self
                    .client
                    .put(url)
                    .headers(http::bearer_headers(access_token)?)
                    .send()
                    .await?;
                read_json(resp).await
            }
        }
    }

    pub async fn delete(&self, access_token: &str, id: &str) -> Result<()> {
        let url = self.item_url(id, &[])?;
        tracing::debug!(%url, "deleting todo");
        let resp = self
            .client
            .delete(url)
            .headers(http::bearer_headers(access_token)?)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(http::status_to_error(status.as_u16(), &body));
        }
        Ok(())
    }

    fn item_url(&self, id: &str, suffix: &[&str]) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| {
                TodoError::Configuration(format!("API endpoint {} cannot take a path", self.endpoint))
            })?
            .pop_if_empty()
            .push(id)
            .extend(suffix);
        Ok(url)
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "todo API request failed");
        return Err(http::status_to_error(status.as_u16(), &body));
    }
    let body = resp.text().await?;
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn item_urls_are_built_under_the_endpoint() {
        let client = TodoClient::new("https://api.example.com/prod/todos/".parse().unwrap());
        assert_eq!(
            client.item_url("a b", &[]).unwrap().as_str(),
            "https://api.example.com/prod/todos/a%20b"
        );
        assert_eq!(
            client.item_url("42", &["toggle"]).unwrap().as_str(),
            "https://api.example.com/prod/todos/42/toggle"
        );
    }

    #[test]
    fn toggle_mode_parses_case_insensitively() {
        assert_eq!(ToggleMode::from_str("Server").unwrap(), ToggleMode::Server);
        assert_eq!(ToggleMode::Client.to_string(), "client");
        assert!(ToggleMode::from_str("both").is_err());
    }
}
