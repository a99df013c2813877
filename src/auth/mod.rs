//! Hosted-UI login, token lifecycle and storage.

pub mod callback;
pub mod error;
pub mod flow;
pub mod hosted_ui;
pub mod session;
pub mod store;
pub mod token;

pub use callback::{LoopbackListener, RedirectParams};
pub use error::AuthError;
pub use flow::{AuthFlow, FlowDecision, FlowOutcome, RedirectSource, TokenSource};
pub use hosted_ui::{HostedUi, HostedUiConfig};
pub use session::Session;
pub use store::{FileTokenStore, TokenStore, TokenStoreConfig};
pub use token::TokenSet;
