//! Web API module for Overdraw
//!
//! Provides REST endpoints for:
//! - Health and engine diagnostics
//! - Live stroke snapshots

pub mod health;
pub mod strokes;

use axum::Router;

pub use health::health_routes;
pub use strokes::strokes_routes;

/// Create the API router with all endpoints
pub fn api_router() -> Router {
    Router::new().merge(health_routes()).merge(strokes_routes())
}
