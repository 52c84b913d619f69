//! Health check endpoints.
//!
//! Provides:
//! - `/health`: liveness plus the live stroke count (for load balancers)
//! - `/health/detailed`: engine status with background tasks and redraw epoch

use axum::extract::Extension;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use std::sync::Arc;

use crate::server::AppState;

/// Simple health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub strokes: usize,
}

/// Detailed health response with engine state
#[derive(Debug, Serialize)]
pub struct DetailedHealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub engine: EngineHealth,
}

/// Engine diagnostics
#[derive(Debug, Serialize)]
pub struct EngineHealth {
    /// Live strokes
    pub strokes: usize,
    /// Ingestion loop plus watchdogs
    pub tasks: usize,
    /// Redraw notifications sent so far
    pub redraw_epoch: u64,
    /// Connected viewers
    pub listeners: usize,
    pub idle_timeout_secs: f64,
}

/// Simple health check (for load balancers)
async fn health_check(Extension(state): Extension<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        strokes: state.engine.stroke_count().await,
    })
}

/// Detailed health check
async fn detailed_health_check(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<DetailedHealthResponse> {
    let engine = &state.engine;
    let status = if engine.is_shut_down() {
        "stopping"
    } else {
        "ok"
    };

    Json(DetailedHealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        engine: EngineHealth {
            strokes: engine.stroke_count().await,
            tasks: engine.task_count(),
            redraw_epoch: engine.notifier().epoch(),
            listeners: engine.notifier().listener_count(),
            idle_timeout_secs: engine.config().idle_timeout.as_secs_f64(),
        },
    })
}

/// Create health routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/detailed", get(detailed_health_check))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let json = serde_json::to_value(HealthResponse {
            status: "ok",
            version: "0.1.0",
            strokes: 3,
        })
        .unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], "0.1.0");
        assert_eq!(json["strokes"], 3);
    }
}
