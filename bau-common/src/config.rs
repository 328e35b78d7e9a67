//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration only: where the database lives, which port to bind,
//! log level and NLU connection defaults. Runtime settings (the NLU API key set
//! through the web API) live in the database `settings` table.
//!
//! # Root Folder Priority
//!
//! 1. Command-line argument (highest priority)
//! 2. Environment variable `BAU_ROOT_FOLDER`
//! 3. TOML config file `root_folder`
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "BAU_ROOT_FOLDER";

/// Environment variable overriding the TOML config path
pub const CONFIG_PATH_ENV: &str = "BAU_CONFIG";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "baustelle.db";

/// Default HTTP port for bau-voice
pub const DEFAULT_PORT: u16 = 5730;

/// Bootstrap configuration loaded from TOML file
///
/// Every field has a default, so an empty or missing file yields a usable
/// configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Root folder holding the database (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder: Option<PathBuf>,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Natural-language-understanding service connection
    #[serde(default)]
    pub nlu: NluConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            port: default_port(),
            bind_address: default_bind_address(),
            logging: LoggingConfig::default(),
            nlu: NluConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// NLU (chat completion) service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NluConfig {
    /// API key (lowest priority source, see bau-voice config resolution)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// OpenAI-compatible chat completions endpoint
    #[serde(default = "default_nlu_endpoint")]
    pub endpoint: String,

    /// Model identifier sent with every request
    #[serde(default = "default_nlu_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_nlu_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NluConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_nlu_endpoint(),
            model: default_nlu_model(),
            timeout_secs: default_nlu_timeout_secs(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_nlu_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_nlu_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_nlu_timeout_secs() -> u64 {
    30
}

// ============================================================================
// TOML file handling
// ============================================================================

/// Default TOML config path: `<config_dir>/baustelle/bau-voice.toml`
///
/// `BAU_CONFIG` overrides the platform location.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }

    dirs::config_dir()
        .map(|d| d.join("baustelle").join("bau-voice.toml"))
        .unwrap_or_else(|| PathBuf::from("bau-voice.toml"))
}

/// Load TOML configuration with graceful degradation
///
/// A missing or malformed file never stops startup: a warning is logged and
/// defaults are returned.
pub fn load_toml_config(path: &Path) -> TomlConfig {
    if !path.exists() {
        warn!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return TomlConfig::default();
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read config {}: {}, using defaults", path.display(), e);
            return TomlConfig::default();
        }
    };

    match toml::from_str::<TomlConfig>(&content) {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Failed to parse config {}: {}, using defaults", path.display(), e);
            TomlConfig::default()
        }
    }
}

/// Write TOML configuration atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, content)?;
    std::fs::rename(&temp_path, path)?;

    Ok(())
}

// ============================================================================
// Root folder resolution
// ============================================================================

/// Resolves the root folder following the documented priority order
#[derive(Debug, Default, Clone)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root folder given on the command line
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    /// Root folder from the TOML config
    pub fn with_toml(mut self, config: &TomlConfig) -> Self {
        self.toml_root = config.root_folder.clone();
        self
    }

    /// Resolve the root folder (never fails, falls back to OS default)
    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            info!("Root folder from command line: {}", path.display());
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                info!("Root folder from {}: {}", ROOT_FOLDER_ENV, path);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_root {
            info!("Root folder from TOML config: {}", path.display());
            return path.clone();
        }

        let path = default_root_folder();
        info!("Root folder from compiled default: {}", path.display());
        path
    }
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("baustelle"))
        .unwrap_or_else(|| PathBuf::from("./baustelle_data"))
}

/// Creates the root folder and locates the database inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create the root folder if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    /// Path of the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }
}
