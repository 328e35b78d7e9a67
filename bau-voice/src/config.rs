//! Configuration resolution for bau-voice
//!
//! Provides multi-tier NLU API key resolution with Database → ENV → TOML priority.

use bau_common::config::TomlConfig;
use bau_common::{Error, Result};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::{info, warn};

/// Environment variable holding the NLU API key
pub const NLU_API_KEY_ENV: &str = "BAU_NLU_API_KEY";

/// Resolve the NLU API key from 3-tier configuration
///
/// **Priority:** Database → ENV → TOML
///
/// A missing key is not an error: the classifier answers with fallback
/// commands until one is configured through the settings endpoint.
pub async fn resolve_nlu_api_key(
    db: &Pool<Sqlite>,
    toml_config: &TomlConfig,
) -> Result<Option<String>> {
    let db_key = crate::db::settings::get_nlu_api_key(db)
        .await?
        .filter(|key| is_valid_key(key));
    let env_key = std::env::var(NLU_API_KEY_ENV)
        .ok()
        .filter(|key| is_valid_key(key));
    let toml_key = toml_config
        .nlu
        .api_key
        .clone()
        .filter(|key| is_valid_key(key));

    let sources: Vec<&str> = [
        ("database", db_key.is_some()),
        ("environment", env_key.is_some()),
        ("TOML", toml_key.is_some()),
    ]
    .into_iter()
    .filter_map(|(name, present)| present.then_some(name))
    .collect();

    if sources.len() > 1 {
        warn!(
            "NLU API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    if let Some(key) = db_key {
        info!("NLU API key loaded from database");
        return Ok(Some(key));
    }

    if let Some(key) = env_key {
        info!("NLU API key loaded from environment variable");
        return Ok(Some(key));
    }

    if let Some(key) = toml_key {
        info!("NLU API key loaded from TOML config");
        return Ok(Some(key));
    }

    warn!(
        "NLU API key not configured; voice commands will use fallback results. \
         Configure via POST /api/settings/nlu_api_key, {} or [nlu] api_key in the TOML config",
        NLU_API_KEY_ENV
    );
    Ok(None)
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Write the API key into the TOML config file
///
/// An existing file that does not parse is left untouched (error). Write
/// failures only warn, since the database already holds the key.
pub async fn sync_api_key_to_toml(key: &str, toml_path: &Path) -> Result<()> {
    let mut config = if toml_path.exists() {
        let content = tokio::fs::read_to_string(toml_path)
            .await
            .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
        toml::from_str::<TomlConfig>(&content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?
    } else {
        TomlConfig::default()
    };

    config.nlu.api_key = Some(key.to_string());

    match bau_common::config::write_toml_config(&config, toml_path) {
        Ok(()) => {
            info!("NLU API key synced to TOML: {}", toml_path.display());
            Ok(())
        }
        Err(e) => {
            warn!("TOML write failed (database write succeeded): {}", e);
            Ok(())
        }
    }
}
