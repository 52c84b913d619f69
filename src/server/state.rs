//! Shared handler state

use overdraw_core::{DrawEngine, Pen};
use std::sync::Arc;

use super::config::AppConfig;

/// State shared by every HTTP and WebSocket handler
#[derive(Debug)]
pub struct AppState {
    /// The running stroke engine
    pub engine: Arc<DrawEngine>,
    /// Required Origin for producer connections (None = any)
    pub allowed_origin: Option<String>,
    /// Pen used for viewer frames
    pub pen: Pen,
}

impl AppState {
    pub fn new(engine: Arc<DrawEngine>, config: &AppConfig) -> Self {
        Self {
            engine,
            allowed_origin: config.server.allowed_origin.clone(),
            pen: config.render.pen(),
        }
    }

    /// Whether a request with this Origin header may produce strokes
    pub fn origin_allowed(&self, origin: Option<&str>) -> bool {
        match &self.allowed_origin {
            None => true,
            Some(allowed) => origin == Some(allowed.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overdraw_core::EngineConfig;

    #[tokio::test]
    async fn test_origin_check() {
        let engine = Arc::new(DrawEngine::start(EngineConfig::default()));
        let mut config = AppConfig::default();

        let open = AppState::new(engine.clone(), &config);
        assert!(open.origin_allowed(None));
        assert!(open.origin_allowed(Some("https://evil.example")));

        config.server.allowed_origin = Some("https://localhost:44190".to_string());
        let locked = AppState::new(engine, &config);
        assert!(locked.origin_allowed(Some("https://localhost:44190")));
        assert!(!locked.origin_allowed(Some("https://evil.example")));
        assert!(!locked.origin_allowed(None));
    }
}
