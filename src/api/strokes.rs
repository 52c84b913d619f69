//! Stroke snapshot endpoint
//!
//! `GET /strokes` returns every live stroke in creation order, the same view
//! a renderer paints from.

use axum::extract::Extension;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use overdraw_core::StrokeSnapshot;
use serde::Serialize;
use std::sync::Arc;

use crate::server::AppState;

/// Snapshot response
#[derive(Debug, Serialize)]
pub struct StrokesResponse {
    pub count: usize,
    pub strokes: Vec<StrokeSnapshot>,
}

async fn list_strokes(Extension(state): Extension<Arc<AppState>>) -> Json<StrokesResponse> {
    let strokes = state.engine.snapshot().await;
    Json(StrokesResponse {
        count: strokes.len(),
        strokes,
    })
}

/// Create stroke routes
pub fn strokes_routes() -> Router {
    Router::new().route("/strokes", get(list_strokes))
}
