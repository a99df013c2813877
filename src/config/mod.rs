//! Configuration system (layered: defaults < config file < env < flags).

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::api::http::{build_client, DEFAULT_TIMEOUT};
use crate::api::{TodoClient, ToggleMode};
use crate::auth::store::default_data_dir;
use crate::auth::{FileTokenStore, HostedUiConfig, TokenStoreConfig};
use crate::error::{Result, TodoError};

/// Name of the config file inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8765/callback";
pub const DEFAULT_SCOPES: &[&str] = &["email", "openid", "phone"];
pub const DEFAULT_LOGIN_WAIT: Duration = Duration::from_secs(120);

const ENV_PREFIX: &str = "TODO_OIDC_";

/// One configuration source. Unset fields defer to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    pub user_pool_domain: Option<String>,
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub logout_uri: Option<String>,
    pub scopes: Option<Vec<String>>,
    pub api_endpoint: Option<String>,
    pub toggle_mode: Option<ToggleMode>,
    pub silent_refresh: Option<bool>,
    pub request_timeout_secs: Option<u64>,
    pub data_dir: Option<PathBuf>,
}

impl ConfigLayer {
    /// Read a TOML layer. A missing file is an empty layer.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(raw) => Self::parse(path, &raw),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(TodoError::Io(err)),
        }
    }

    /// Read a TOML layer the user named explicitly; the file must exist.
    pub fn load_required(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| {
            TodoError::Configuration(format!("cannot read config file {}: {err}", path.display()))
        })?;
        Self::parse(path, &raw)
    }

    fn parse(path: &Path, raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|err| {
            TodoError::Configuration(format!("invalid config file {}: {err}", path.display()))
        })
    }

    /// Layer from `TODO_OIDC_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Layer from an arbitrary variable lookup, keyed by full variable name.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}")).filter(|v| !v.trim().is_empty())
        };
        Ok(Self {
            user_pool_domain: get("USER_POOL_DOMAIN"),
            client_id: get("CLIENT_ID"),
            redirect_uri: get("REDIRECT_URI"),
            logout_uri: get("LOGOUT_URI"),
            scopes: get("SCOPES").map(|raw| split_scopes(&raw)),
            api_endpoint: get("API_ENDPOINT"),
            toggle_mode: get("TOGGLE_MODE")
                .map(|raw| parse_var::<ToggleMode>("TOGGLE_MODE", &raw))
                .transpose()?,
            silent_refresh: get("SILENT_REFRESH")
                .map(|raw| parse_bool("SILENT_REFRESH", &raw))
                .transpose()?,
            request_timeout_secs: get("REQUEST_TIMEOUT_SECS")
                .map(|raw| parse_var::<u64>("REQUEST_TIMEOUT_SECS", &raw))
                .transpose()?,
            data_dir: get("DATA_DIR").map(PathBuf::from),
        })
    }

    /// Overlay `other` on top of `self`; set fields in `other` win.
    pub fn merge(self, other: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            user_pool_domain: other.user_pool_domain.or(self.user_pool_domain),
            client_id: other.client_id.or(self.client_id),
            redirect_uri: other.redirect_uri.or(self.redirect_uri),
            logout_uri: other.logout_uri.or(self.logout_uri),
            scopes: other.scopes.or(self.scopes),
            api_endpoint: other.api_endpoint.or(self.api_endpoint),
            toggle_mode: other.toggle_mode.or(self.toggle_mode),
            silent_refresh: other.silent_refresh.or(self.silent_refresh),
            request_timeout_secs: other.request_timeout_secs.or(self.request_timeout_secs),
            data_dir: other.data_dir.or(self.data_dir),
        }
    }
}

/// Resolved client configuration.
#[derive(Debug, Clone)]
pub struct TodoConfig {
    pub user_pool_domain: Url,
    pub client_id: String,
    pub redirect_uri: String,
    pub logout_uri: String,
    pub scopes: Vec<String>,
    pub api_endpoint: Url,
    pub toggle_mode: ToggleMode,
    pub silent_refresh: bool,
    pub request_timeout: Duration,
    pub data_dir: PathBuf,
}

impl TodoConfig {
    /// Load all layers: `.env`, the config file, the environment, then `overrides`.
    ///
    /// The config file is `config_path` if given, and must then exist;
    /// otherwise `config.toml` in the data directory, which may be absent.
    pub fn load(config_path: Option<&Path>, overrides: ConfigLayer) -> Result<Self> {
        let _ = dotenvy::dotenv();
        let env = ConfigLayer::from_env()?;
        let data_dir = overrides
            .data_dir
            .clone()
            .or_else(|| env.data_dir.clone())
            .unwrap_or_else(default_data_dir);
        let (file_path, file) = match config_path {
            Some(path) => (path.to_path_buf(), ConfigLayer::load_required(path)?),
            None => {
                let path = data_dir.join(CONFIG_FILE_NAME);
                let layer = ConfigLayer::load_file(&path)?;
                (path, layer)
            }
        };
        tracing::debug!(path = %file_path.display(), "configuration loaded");
        Self::resolve(file.merge(env).merge(overrides))
    }

    /// Validate a merged layer and fill defaults.
    pub fn resolve(layer: ConfigLayer) -> Result<Self> {
        let domain = required(layer.user_pool_domain, "user_pool_domain")?;
        let user_pool_domain = parse_url("user_pool_domain", &with_scheme(&domain))?;
        let client_id = required(layer.client_id, "client_id")?;
        let api_endpoint = parse_url(
            "api_endpoint",
            &required(layer.api_endpoint, "api_endpoint")?,
        )?;
        let redirect_uri = layer
            .redirect_uri
            .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string());
        parse_url("redirect_uri", &redirect_uri)?;
        let logout_uri = layer.logout_uri.unwrap_or_else(|| redirect_uri.clone());
        let scopes = layer
            .scopes
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect());

        Ok(Self {
            user_pool_domain,
            client_id,
            redirect_uri,
            logout_uri,
            scopes,
            api_endpoint,
            toggle_mode: layer.toggle_mode.unwrap_or_default(),
            silent_refresh: layer.silent_refresh.unwrap_or(true),
            request_timeout: layer
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
            data_dir: layer.data_dir.unwrap_or_else(default_data_dir),
        })
    }

    pub fn hosted_ui(&self) -> HostedUiConfig {
        HostedUiConfig {
            domain: self.user_pool_domain.clone(),
            client_id: self.client_id.clone(),
            redirect_uri: self.redirect_uri.clone(),
            logout_uri: self.logout_uri.clone(),
            scopes: self.scopes.clone(),
        }
    }

    pub fn token_store(&self) -> FileTokenStore {
        FileTokenStore::new(TokenStoreConfig::new(self.data_dir.clone()))
    }

    pub fn http_client(&self) -> Result<reqwest::Client> {
        build_client(self.request_timeout)
    }

    pub fn todo_client(&self, http: reqwest::Client) -> TodoClient {
        TodoClient::new(self.api_endpoint.clone())
            .with_client(http)
            .with_toggle_mode(self.toggle_mode)
    }
}

fn required(value: Option<String>, key: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| TodoError::MissingConfiguration {
            key: key.to_string(),
        })
}

/// Cognito domains are usually given bare (`pool.auth.region.amazoncognito.com`).
fn with_scheme(domain: &str) -> String {
    if domain.contains("://") {
        domain.to_string()
    } else {
        format!("https://{domain}")
    }
}

fn parse_url(key: &str, raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|err| TodoError::Configuration(format!("{key}: {err} ({raw})")))
}

fn split_scopes(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace() || c == '+')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_var<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim().parse::<T>().map_err(|_| {
        TodoError::Configuration(format!("{ENV_PREFIX}{name} has invalid value '{raw}'"))
    })
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(TodoError::Configuration(format!(
            "{ENV_PREFIX}{name} has invalid value '{raw}'"
        ))),
    }
}
