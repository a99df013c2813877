#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::MockServer;

use todo_oidc::api::{ToggleMode, TodoClient};

pub const CREATED: &str = "2025-01-05T15:04:00Z";
pub const COMPLETED: &str = "2025-01-06T09:30:00Z";

pub fn todo_json(id: &str, title: &str, completed_at: Option<&str>) -> Value {
    json!({
        "id": id,
        "title": title,
        "createdAt": CREATED,
        "completedAt": completed_at,
    })
}

pub fn client_for(server: &MockServer, mode: ToggleMode) -> TodoClient {
    let endpoint = format!("{}/todos", server.uri());
    TodoClient::new(endpoint.parse().expect("endpoint url")).with_toggle_mode(mode)
}
