//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$MAILGUNNER_CONFIG` (environment variable)
//! 2. `~/.config/mailgunner/config.toml` (Linux/macOS)
//!    `%APPDATA%\mailgunner\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Provider account and submission settings.
    pub provider: ProviderConfig,
    /// Where and how attachments are staged.
    pub staging: StagingConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override directory for log files.
    pub log_dir: Option<PathBuf>,
}

/// Provider account and submission settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Sending domain registered with the provider.
    pub api_domain: String,
    /// Recipients per chunk in batch mode.
    pub batch_threshold: usize,
}

/// Attachment staging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Directory for staged files (default: the system temp dir).
    pub temp_dir: Option<PathBuf>,
    /// Prefix of every staged file name.
    pub file_prefix: String,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_dir: None,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_domain: String::new(),
            batch_threshold: 1000,
        }
    }
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            file_prefix: "SS_MG_TMP".to_string(),
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Save configuration to the standard location.
pub fn save_config(config: &Config) -> anyhow::Result<PathBuf> {
    let path = config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(&path, render_config(config)?)?;
    tracing::info!(path = %path.display(), "Saved config");
    Ok(path)
}

/// Serialize configuration as pretty TOML.
pub fn render_config(config: &Config) -> anyhow::Result<String> {
    Ok(toml::to_string_pretty(config)?)
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("MAILGUNNER_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    dirs::config_dir().map(|d| d.join("mailgunner").join("config.toml"))
}

/// Return the directory for log files.
pub fn log_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.log_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailgunner")
}
