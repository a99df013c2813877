use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::AuthError;
use super::token::TokenSet;

/// File name of the single persisted token entry.
pub const TOKEN_FILE_NAME: &str = "tokens.toml";

const TOKEN_FILE_VERSION: u32 = 1;

/// Storage abstraction for the persisted token set.
///
/// There is exactly one slot: `save` overwrites it, `clear` empties it.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<TokenSet>, AuthError>;
    fn save(&self, tokens: &TokenSet) -> Result<(), AuthError>;
    fn clear(&self) -> Result<(), AuthError>;
}

/// Configuration for file-backed token storage.
#[derive(Debug, Clone)]
pub struct TokenStoreConfig {
    pub base_dir: PathBuf,
}

impl TokenStoreConfig {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }
}

/// File-backed token store using a TOML file.
///
/// # Example
/// ```no_run
/// use todo_oidc::auth::{FileTokenStore, TokenSet, TokenStore};
///
/// let store = FileTokenStore::new_default();
/// let tokens = TokenSet {
///     access_token: "access".to_string(),
///     id_token: Some("id".to_string()),
///     refresh_token: None,
///     expires_in: 3600,
///     token_type: "Bearer".to_string(),
///     obtained_at: None,
/// };
/// store.save(&tokens)?;
/// # Ok::<(), todo_oidc::auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    base_dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(config: TokenStoreConfig) -> Self {
        Self {
            base_dir: config.base_dir,
        }
    }

    pub fn new_default() -> Self {
        Self {
            base_dir: default_data_dir(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.base_dir.join(TOKEN_FILE_NAME)
    }

    fn ensure_parent(path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<TokenSet>, AuthError> {
        let path = self.path();
        let raw = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        let file: TokenFile = toml::from_str(&raw)?;
        if file.version != TOKEN_FILE_VERSION {
            return Err(AuthError::Serialization(format!(
                "unsupported token file version {} at {}",
                file.version,
                path.display()
            )));
        }
        Ok(Some(file.tokens))
    }

    fn save(&self, tokens: &TokenSet) -> Result<(), AuthError> {
        let path = self.path();
        Self::ensure_parent(&path)?;
        let file = TokenFile {
            version: TOKEN_FILE_VERSION,
            saved_at: Utc::now(),
            tokens: tokens.clone(),
        };
        let serialized = toml::to_string(&file)?;
        fs::write(&path, serialized)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }
        tracing::debug!(path = %path.display(), "token set saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenFile {
    version: u32,
    saved_at: DateTime<Utc>,
    tokens: TokenSet,
}

/// `~/.todo-oidc`, or a relative `.todo-oidc` when no home directory exists.
pub fn default_data_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".todo-oidc"))
        .unwrap_or_else(|| PathBuf::from(".todo-oidc"))
}
