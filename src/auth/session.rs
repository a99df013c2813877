use std::sync::{Arc, RwLock};

use super::error::AuthError;
use super::store::TokenStore;
use super::token::TokenSet;

/// The current login, passed explicitly to everything that needs a token.
///
/// Wraps a [`TokenStore`] with an in-memory slot. `set` and `clear` write
/// through to the store. `get` serves the slot, falling back to the store
/// on first use. An unreadable stored entry counts as logged out.
pub struct Session {
    store: Arc<dyn TokenStore>,
    current: RwLock<Slot>,
}

enum Slot {
    Unloaded,
    Loaded(Option<TokenSet>),
}

impl Session {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            current: RwLock::new(Slot::Unloaded),
        }
    }

    /// Current token set, if any. Sets without an access token are ignored.
    pub fn get(&self) -> Option<TokenSet> {
        if let Ok(slot) = self.current.read() {
            if let Slot::Loaded(tokens) = &*slot {
                return tokens.clone();
            }
        }
        let loaded = match self.store.load() {
            Ok(tokens) => tokens.filter(TokenSet::has_access_token),
            Err(err) => {
                tracing::warn!(error = %err, "ignoring unreadable cached token");
                None
            }
        };
        if let Ok(mut slot) = self.current.write() {
            *slot = Slot::Loaded(loaded.clone());
        }
        loaded
    }

    /// Access token of the current set, or [`AuthError::NotLoggedIn`].
    pub fn access_token(&self) -> Result<String, AuthError> {
        self.get()
            .map(|tokens| tokens.access_token)
            .ok_or(AuthError::NotLoggedIn)
    }

    pub fn set(&self, tokens: TokenSet) -> Result<(), AuthError> {
        self.store.save(&tokens)?;
        if let Ok(mut slot) = self.current.write() {
            *slot = Slot::Loaded(Some(tokens));
        }
        Ok(())
    }

    /// Drop the current set and return it.
    ///
    /// The in-memory slot is emptied even if the store fails to delete.
    pub fn clear(&self) -> Result<Option<TokenSet>, AuthError> {
        let previous = self.get();
        if let Ok(mut slot) = self.current.write() {
            *slot = Slot::Loaded(None);
        }
        self.store.clear()?;
        Ok(previous)
    }

    pub fn is_logged_in(&self) -> bool {
        self.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::{FileTokenStore, TokenStoreConfig};
    use tempfile::TempDir;

    fn temp_session() -> (TempDir, Arc<FileTokenStore>, Session) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileTokenStore::new(TokenStoreConfig::new(
            dir.path().to_path_buf(),
        )));
        let session = Session::new(store.clone());
        (dir, store, session)
    }

    fn tokens(access: &str) -> TokenSet {
        TokenSet {
            access_token: access.to_string(),
            id_token: Some("id".to_string()),
            refresh_token: None,
            expires_in: 3600,
            token_type: "Bearer".to_string(),
            obtained_at: None,
        }
    }

    #[test]
    fn get_reads_existing_store_entry() {
        let (_dir, store, session) = temp_session();
        store.save(&tokens("cached")).unwrap();
        assert_eq!(session.access_token().unwrap(), "cached");
    }

    #[test]
    fn set_writes_through() {
        let (_dir, store, session) = temp_session();
        session.set(tokens("fresh")).unwrap();
        assert_eq!(store.load().unwrap().unwrap().access_token, "fresh");
        assert!(session.is_logged_in());
    }

    #[test]
    fn clear_returns_previous_and_empties_store() {
        let (_dir, store, session) = temp_session();
        session.set(tokens("old")).unwrap();
        let previous = session.clear().unwrap();
        assert_eq!(previous.unwrap().access_token, "old");
        assert!(store.load().unwrap().is_none());
        assert!(matches!(session.access_token(), Err(AuthError::NotLoggedIn)));
    }

    #[test]
    fn unreadable_entry_counts_as_logged_out() {
        let (_dir, store, session) = temp_session();
        std::fs::write(store.path(), "garbage = [").unwrap();
        assert!(!session.is_logged_in());
    }

    #[test]
    fn entry_without_access_token_counts_as_logged_out() {
        let (_dir, store, session) = temp_session();
        store.save(&tokens("")).unwrap();
        assert!(session.get().is_none());
    }
}
