//! Integration tests for layered configuration and the token file store.

use std::path::PathBuf;

use chrono::Utc;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use todo_oidc::api::ToggleMode;
use todo_oidc::auth::{FileTokenStore, TokenSet, TokenStore, TokenStoreConfig};
use todo_oidc::config::{ConfigLayer, TodoConfig, CONFIG_FILE_NAME};
use todo_oidc::error::TodoError;

fn write_config(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, body).expect("write config");
    path
}

#[test]
fn file_layer_parses_all_keys() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(
        &dir,
        r#"
user_pool_domain = "pool.auth.eu-west-1.amazoncognito.com"
client_id = "abc123"
api_endpoint = "https://api.example.com/prod/todos"
scopes = ["openid"]
toggle_mode = "server"
silent_refresh = false
request_timeout_secs = 5
"#,
    );

    let layer = ConfigLayer::load_file(&path).expect("load");
    let config = TodoConfig::resolve(layer).expect("resolve");

    assert_eq!(
        config.user_pool_domain.as_str(),
        "https://pool.auth.eu-west-1.amazoncognito.com/"
    );
    assert_eq!(config.client_id, "abc123");
    assert_eq!(config.scopes, vec!["openid".to_string()]);
    assert_eq!(config.toggle_mode, ToggleMode::Server);
    assert!(!config.silent_refresh);
    assert_eq!(config.request_timeout.as_secs(), 5);
    assert_eq!(config.logout_uri, config.redirect_uri);
}

#[test]
fn missing_file_is_an_empty_layer() {
    let dir = TempDir::new().expect("tempdir");
    let layer = ConfigLayer::load_file(dir.path().join("absent.toml")).expect("load");
    assert_eq!(layer, ConfigLayer::default());
}

#[test]
fn explicit_config_path_must_exist() {
    let dir = TempDir::new().expect("tempdir");
    let typo = dir.path().join("confg.toml");
    let overrides = ConfigLayer {
        data_dir: Some(dir.path().to_path_buf()),
        ..ConfigLayer::default()
    };

    let err = TodoConfig::load(Some(typo.as_path()), overrides).expect_err("missing file");

    match err {
        TodoError::Configuration(message) => assert!(message.contains("confg.toml")),
        other => panic!("expected Configuration error, got {other:?}"),
    }
}

#[test]
fn unknown_key_is_a_configuration_error() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(&dir, "client_secret = \"nope\"\n");

    let err = ConfigLayer::load_file(&path).expect_err("unknown key");
    assert!(matches!(err, TodoError::Configuration(_)));
}

#[test]
fn env_layer_overrides_file_layer() {
    let file = ConfigLayer {
        user_pool_domain: Some("https://file.example.com".to_string()),
        client_id: Some("file-client".to_string()),
        api_endpoint: Some("https://file.example.com/todos".to_string()),
        ..ConfigLayer::default()
    };
    let env = ConfigLayer::from_vars(|key| match key {
        "TODO_OIDC_CLIENT_ID" => Some("env-client".to_string()),
        "TODO_OIDC_SCOPES" => Some("email, openid".to_string()),
        _ => None,
    })
    .expect("env layer");

    let config = TodoConfig::resolve(file.merge(env)).expect("resolve");

    assert_eq!(config.client_id, "env-client");
    assert_eq!(config.scopes, vec!["email".to_string(), "openid".to_string()]);
    assert_eq!(config.api_endpoint.as_str(), "https://file.example.com/todos");
}

#[test]
fn load_reads_config_from_given_path_and_applies_overrides() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(
        &dir,
        r#"
user_pool_domain = "https://pool.example.com"
client_id = "file-client"
api_endpoint = "https://file.example.com/todos"
"#,
    );
    let overrides = ConfigLayer {
        api_endpoint: Some("http://localhost:9000/todos".to_string()),
        data_dir: Some(dir.path().to_path_buf()),
        ..ConfigLayer::default()
    };

    let config = TodoConfig::load(Some(path.as_path()), overrides).expect("load");

    assert_eq!(config.api_endpoint.as_str(), "http://localhost:9000/todos");
    assert_eq!(config.data_dir, dir.path().to_path_buf());
    assert_eq!(
        config.token_store().path(),
        dir.path().join("tokens.toml")
    );
    let client = config.todo_client(config.http_client().expect("http client"));
    assert_eq!(client.endpoint().as_str(), "http://localhost:9000/todos");
}

#[test]
fn hosted_ui_config_mirrors_resolved_values() {
    let config = TodoConfig::resolve(ConfigLayer {
        user_pool_domain: Some("pool.example.com".to_string()),
        client_id: Some("client".to_string()),
        api_endpoint: Some("https://api.example.com/todos".to_string()),
        redirect_uri: Some("http://127.0.0.1:9999/cb".to_string()),
        ..ConfigLayer::default()
    })
    .expect("resolve");

    let ui = config.hosted_ui();
    assert_eq!(ui.client_id, "client");
    assert_eq!(ui.redirect_uri, "http://127.0.0.1:9999/cb");
    assert_eq!(ui.logout_uri, "http://127.0.0.1:9999/cb");
    assert_eq!(ui.scopes.len(), 3);
}

#[test]
fn token_file_survives_a_new_store_instance() {
    let dir = TempDir::new().expect("tempdir");
    let tokens = TokenSet {
        access_token: "acc".to_string(),
        id_token: Some("id".to_string()),
        refresh_token: Some("ref".to_string()),
        expires_in: 3600,
        token_type: "Bearer".to_string(),
        obtained_at: Some(Utc::now()),
    };

    FileTokenStore::new(TokenStoreConfig::new(dir.path().to_path_buf()))
        .save(&tokens)
        .expect("save");
    let loaded = FileTokenStore::new(TokenStoreConfig::new(dir.path().to_path_buf()))
        .load()
        .expect("load")
        .expect("present");

    assert_eq!(loaded.access_token, "acc");
    assert_eq!(loaded.refresh_token.as_deref(), Some("ref"));
    assert_eq!(
        loaded.obtained_at.map(|t| t.timestamp()),
        tokens.obtained_at.map(|t| t.timestamp())
    );
}
