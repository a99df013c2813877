//! The todo application: session + API client + view.

use std::sync::Arc;

use crate::api::TodoClient;
use crate::auth::Session;
use crate::error::{Result, TodoError};
use crate::types::{NewTodo, Todo};
use crate::view::TodoView;

/// Wires user actions to the API and keeps the view in step.
///
/// Every action takes `&mut self`, so a mutation and the view update that
/// follows it complete before the next action starts.
///
/// A 401 from any call clears the session before the error is returned, so
/// the stale token is never sent again.
pub struct TodoApp {
    session: Arc<Session>,
    client: TodoClient,
    view: TodoView,
}

impl TodoApp {
    pub fn new(session: Arc<Session>, client: TodoClient, view: TodoView) -> Self {
        Self {
            session,
            client,
            view,
        }
    }

    pub fn view(&self) -> &TodoView {
        &self.view
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Fetch the list and replace the held copy.
    pub async fn refresh(&mut self) -> Result<&TodoView> {
        let token = self.session.access_token()?;
        let todos = self.guard(self.client.list(&token).await)?;
        tracing::debug!(count = todos.len(), "todos fetched");
        self.view.replace_all(todos);
        Ok(&self.view)
    }

    /// Create a todo and put the server's copy at the front of the list.
    pub async fn add(&mut self, title: &str) -> Result<Todo> {
        let new_todo = NewTodo::new(title)?;
        let token = self.session.access_token()?;
        let created = self.guard(self.client.create(&token, &new_todo).await)?;
        self.view.insert_front(created.clone());
        Ok(created)
    }

    /// Flip completion of the todo selected by id or list position.
    pub async fn toggle(&mut self, selector: &str) -> Result<Todo> {
        let current = self.lookup(selector)?;
        let token = self.session.access_token()?;
        let updated = self.guard(self.client.toggle(&token, &current).await)?;
        if !self.view.replace_item(updated.clone()) {
            self.view.insert_front(updated.clone());
        }
        Ok(updated)
    }

    /// Delete the todo selected by id or list position.
    pub async fn delete(&mut self, selector: &str) -> Result<Todo> {
        let current = self.lookup(selector)?;
        let token = self.session.access_token()?;
        self.guard(self.client.delete(&token, &current.id).await)?;
        self.view.remove(&current.id);
        Ok(current)
    }

    fn lookup(&self, selector: &str) -> Result<Todo> {
        self.view
            .find(selector)
            .cloned()
            .ok_or_else(|| TodoError::NotFound(selector.trim().to_string()))
    }

    fn guard<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(TodoError::SessionExpired) = &result {
            tracing::warn!("API rejected the token, clearing session");
            if let Err(err) = self.session.clear() {
                tracing::warn!(error = %err, "failed to clear token store");
            }
        }
        result
    }
}
