//! Server configuration types
//!
//! Contains all configuration structures for the Overdraw server.

use anyhow::{Context, Result};
use overdraw_core::{EngineConfig, Pen};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub strokes: StrokesConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

impl AppConfig {
    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            strokes: StrokesConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin header required on `/draw` upgrades (None = any origin)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_origin: Option<String>,
    /// Drawing page served at `/`
    #[serde(default = "default_index_path")]
    pub index_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 44190,
            allowed_origin: None,
            index_path: default_index_path(),
        }
    }
}

fn default_index_path() -> String {
    "static/index.html".to_string()
}

/// Stroke lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrokesConfig {
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_point_capacity")]
    pub point_capacity: usize,
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl StrokesConfig {
    /// Engine settings for these values
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .with_point_capacity(self.point_capacity)
            .with_shutdown_timeout(Duration::from_secs(self.shutdown_timeout_secs))
    }
}

impl Default for StrokesConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout(),
            point_capacity: default_point_capacity(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

fn default_idle_timeout() -> u64 {
    10
}

fn default_point_capacity() -> usize {
    100
}

fn default_shutdown_timeout() -> u64 {
    5
}

/// Pen settings for rendered frames
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_pen_width")]
    pub pen_width: f32,
    #[serde(default = "default_pen_alpha")]
    pub pen_alpha: u8,
}

impl RenderConfig {
    pub fn pen(&self) -> Pen {
        Pen {
            width: self.pen_width,
            alpha: self.pen_alpha,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            pen_width: default_pen_width(),
            pen_alpha: default_pen_alpha(),
        }
    }
}

fn default_pen_width() -> f32 {
    10.0
}

fn default_pen_alpha() -> u8 {
    128
}
