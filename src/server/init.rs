//! Server initialization and main run loop
//!
//! Contains the main `run()` function that starts the engine and the HTTP
//! server, and tears both down on Ctrl+C / SIGTERM.

use super::config::AppConfig;
use super::loader::load_config;
use super::signal::wait_for_shutdown_signal;
use super::state::AppState;
use super::validation::validate_config;
use crate::cli::ServeArgs;
use anyhow::{Context, Result};
use axum::{Extension, Router};
use overdraw_core::DrawEngine;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeFile, trace::TraceLayer};
use tracing::{info, warn};

/// Apply command-line overrides on top of loaded configuration
pub fn apply_overrides(config: &mut AppConfig, args: &ServeArgs) {
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(origin) = &args.origin {
        config.server.allowed_origin = Some(origin.clone());
    }
    if let Some(secs) = args.idle_timeout_secs {
        config.strokes.idle_timeout_secs = secs;
    }
}

/// Build the main router with all endpoints
pub fn build_router(state: Arc<AppState>, index_path: &str) -> Router {
    let index = std::path::Path::new(index_path);
    if !index.exists() {
        warn!(path = %index.display(), "Drawing page not found; / will return 404");
    }

    Router::new()
        .merge(crate::api::api_router())
        .merge(crate::websocket::websocket_router())
        .route_service("/", ServeFile::new(index))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Run the server
pub async fn run(args: ServeArgs) -> Result<()> {
    info!("Starting Overdraw v{}", env!("CARGO_PKG_VERSION"));

    let mut config = load_config().context("Failed to load configuration")?;
    apply_overrides(&mut config, &args);
    validate_config(&config)?;
    info!("Configuration loaded");

    if config.server.allowed_origin.is_none() {
        info!("Accepting draw connections from any origin");
    }

    let engine = Arc::new(DrawEngine::start(config.strokes.engine_config()));
    let state = Arc::new(AppState::new(Arc::clone(&engine), &config));
    let app = build_router(state, &config.server.index_path);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .context("HTTP server error")?;

    engine.shutdown().await;

    info!("Overdraw shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use overdraw_core::{DrawEvent, EngineConfig, Point, StrokeKey};
    use tower::ServiceExt;

    fn test_app(config: &AppConfig) -> (Router, Arc<DrawEngine>) {
        let engine = Arc::new(DrawEngine::start(EngineConfig::default()));
        let state = Arc::new(AppState::new(Arc::clone(&engine), config));
        (build_router(state, "does/not/exist.html"), engine)
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = AppConfig::default();
        let args = ServeArgs {
            host: Some("127.0.0.1".to_string()),
            port: Some(9000),
            origin: Some("https://localhost:9000".to_string()),
            idle_timeout_secs: Some(3),
        };

        apply_overrides(&mut config, &args);

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(
            config.server.allowed_origin.as_deref(),
            Some("https://localhost:9000")
        );
        assert_eq!(config.strokes.idle_timeout_secs, 3);
    }

    #[test]
    fn test_apply_no_overrides() {
        let mut config = AppConfig::default();
        apply_overrides(&mut config, &ServeArgs::default());
        assert_eq!(config.server.port, 44190);
        assert_eq!(config.strokes.idle_timeout_secs, 10);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (app, _engine) = test_app(&AppConfig::default());

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["strokes"], 0);
    }

    #[tokio::test]
    async fn test_strokes_endpoint_returns_snapshot() {
        let (app, engine) = test_app(&AppConfig::default());
        engine
            .submit(DrawEvent::new(StrokeKey::new(1, 255, 0, 0), Point::new(0.1, 0.1)))
            .unwrap();
        engine.flush().await.unwrap();

        let response = app
            .oneshot(Request::get("/strokes").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["strokes"][0]["id"], 1);
        assert_eq!(body["strokes"][0]["r"], 255);
        assert_eq!(body["strokes"][0]["points"][0]["x"], 0.1);
        assert!(body["strokes"][0]["created_at"].is_string());
    }

    #[tokio::test]
    async fn test_detailed_health_reports_engine() {
        let (app, engine) = test_app(&AppConfig::default());
        engine
            .submit(DrawEvent::new(StrokeKey::new(1, 0, 0, 0), Point::new(0.5, 0.5)))
            .unwrap();
        engine.flush().await.unwrap();

        let response = app
            .oneshot(Request::get("/health/detailed").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(body["engine"]["strokes"], 1);
        assert_eq!(body["engine"]["tasks"], 2);
        assert_eq!(body["engine"]["redraw_epoch"], 1);
    }

    #[tokio::test]
    async fn test_draw_rejects_disallowed_origin() {
        let mut config = AppConfig::default();
        config.server.allowed_origin = Some("https://localhost:44190".to_string());
        let (app, _engine) = test_app(&config);

        let request = Request::get("/draw")
            .header(header::ORIGIN, "https://evil.example")
            .header(header::CONNECTION, "upgrade")
            .header(header::UPGRADE, "websocket")
            .header(header::SEC_WEBSOCKET_VERSION, "13")
            .header(header::SEC_WEBSOCKET_KEY, "dGhlIHNhbXBsZSBub25jZQ==")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_draw_allowed_origin_reaches_upgrade() {
        let mut config = AppConfig::default();
        config.server.allowed_origin = Some("https://localhost:44190".to_string());
        let (app, _engine) = test_app(&config);

        let request = Request::get("/draw")
            .header(header::ORIGIN, "https://localhost:44190")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_ne!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_draw_after_shutdown_is_unavailable() {
        let (app, engine) = test_app(&AppConfig::default());
        engine.shutdown().await;

        let response = app
            .oneshot(Request::get("/draw").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_missing_index_is_not_found() {
        let (app, _engine) = test_app(&AppConfig::default());

        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
