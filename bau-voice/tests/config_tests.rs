//! NLU API key resolution tests
//!
//! Tests that manipulate BAU_NLU_API_KEY are marked with #[serial]
//! to ensure they run sequentially, not in parallel.

use bau_common::config::{NluConfig, TomlConfig};
use bau_voice::config::{resolve_nlu_api_key, NLU_API_KEY_ENV};
use serial_test::serial;
use std::env;

fn toml_with_key(key: Option<&str>) -> TomlConfig {
    TomlConfig {
        nlu: NluConfig {
            api_key: key.map(str::to_string),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[tokio::test]
#[serial]
async fn test_database_key_wins() {
    let pool = bau_common::db::init_in_memory().await.unwrap();
    bau_voice::db::settings::set_nlu_api_key(&pool, "db-key".to_string())
        .await
        .unwrap();
    env::set_var(NLU_API_KEY_ENV, "env-key");

    let key = resolve_nlu_api_key(&pool, &toml_with_key(Some("toml-key")))
        .await
        .unwrap();

    env::remove_var(NLU_API_KEY_ENV);
    assert_eq!(key.as_deref(), Some("db-key"));
}

#[tokio::test]
#[serial]
async fn test_environment_key_beats_toml() {
    let pool = bau_common::db::init_in_memory().await.unwrap();
    env::set_var(NLU_API_KEY_ENV, "env-key");

    let key = resolve_nlu_api_key(&pool, &toml_with_key(Some("toml-key")))
        .await
        .unwrap();

    env::remove_var(NLU_API_KEY_ENV);
    assert_eq!(key.as_deref(), Some("env-key"));
}

#[tokio::test]
#[serial]
async fn test_toml_key_used_last() {
    let pool = bau_common::db::init_in_memory().await.unwrap();
    env::remove_var(NLU_API_KEY_ENV);

    let key = resolve_nlu_api_key(&pool, &toml_with_key(Some("toml-key")))
        .await
        .unwrap();

    assert_eq!(key.as_deref(), Some("toml-key"));
}

#[tokio::test]
#[serial]
async fn test_blank_keys_are_ignored() {
    let pool = bau_common::db::init_in_memory().await.unwrap();
    bau_voice::db::settings::set_nlu_api_key(&pool, "   ".to_string())
        .await
        .unwrap();
    env::set_var(NLU_API_KEY_ENV, "");

    let key = resolve_nlu_api_key(&pool, &toml_with_key(Some("toml-key")))
        .await
        .unwrap();

    env::remove_var(NLU_API_KEY_ENV);
    assert_eq!(key.as_deref(), Some("toml-key"));
}

#[tokio::test]
#[serial]
async fn test_missing_key_is_not_an_error() {
    let pool = bau_common::db::init_in_memory().await.unwrap();
    env::remove_var(NLU_API_KEY_ENV);

    let key = resolve_nlu_api_key(&pool, &toml_with_key(None)).await.unwrap();

    assert_eq!(key, None);
}
