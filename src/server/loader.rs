//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use super::config::AppConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    let environment = std::env::var("OVERDRAW_ENV").unwrap_or_else(|_| "development".to_string());

    let config = Config::builder()
        // 1. Compiled-in defaults
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. Deployment files, later ones win
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{}", environment)).required(false))
        .add_source(File::with_name("config/local").required(false))
        // 3. OVERDRAW_<SECTION>__<KEY>, e.g. OVERDRAW_STROKES__IDLE_TIMEOUT_SECS
        .add_source(
            Environment::with_prefix("OVERDRAW")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}
