use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TodoError;

/// A todo item as owned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Todo {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Copy with `completed_at` flipped: set to `now` when pending, cleared when done.
    pub fn toggled(&self, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.completed_at = match self.completed_at {
            Some(_) => None,
            None => Some(now),
        };
        next
    }
}

/// Body of a create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTodo {
    pub title: String,
}

impl NewTodo {
    /// Trimmed title; blank titles are rejected before any request.
    pub fn new(title: &str) -> Result<Self, TodoError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TodoError::InvalidArgument(
                "todo title must not be empty".to_string(),
            ));
        }
        Ok(Self {
            title: title.to_string(),
        })
    }
}
