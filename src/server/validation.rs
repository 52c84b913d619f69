//! Configuration validation
//!
//! Hard errors for values the engine cannot run with, plus exposure
//! warnings for production deployments.

use super::config::AppConfig;
use anyhow::{bail, Result};
use tracing::warn;

/// Validate configuration before starting the server
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.server.port == 0 {
        bail!("server.port must be non-zero");
    }

    if config.strokes.idle_timeout_secs == 0 {
        bail!("strokes.idle_timeout_secs must be at least 1");
    }

    if !(0.0..=100.0).contains(&config.render.pen_width) {
        bail!(
            "render.pen_width must be between 0 and 100, got {}",
            config.render.pen_width
        );
    }

    let is_production = std::env::var("OVERDRAW_ENV")
        .map(|v| v.to_lowercase() == "production")
        .unwrap_or(false);

    if is_production && config.server.host == "0.0.0.0" && config.server.allowed_origin.is_none() {
        warn!(
            "SECURITY WARNING: Server is reachable on all interfaces and accepts drawing \
             from any origin. Set [server] allowed_origin or bind to 127.0.0.1."
        );
    }

    Ok(())
}
