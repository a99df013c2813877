//! todo-oidc: a todo list client that logs in through a Cognito-style
//! hosted UI (OAuth 2.0 authorization code grant) and talks to a
//! bearer-protected `/todos` API.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use todo_oidc::app::TodoApp;
//! use todo_oidc::auth::Session;
//! use todo_oidc::config::{ConfigLayer, TodoConfig};
//!
//! # async fn example() -> todo_oidc::error::Result<()> {
//! let config = TodoConfig::load(None, ConfigLayer::default())?;
//! let session = Arc::new(Session::new(Arc::new(config.token_store())));
//! let http = config.http_client()?;
//! let mut app = TodoApp::new(session, config.todo_client(http), Default::default());
//! print!("{}", app.refresh().await?.render());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod types;
pub mod view;

#[cfg(feature = "cli")]
pub mod cli;
