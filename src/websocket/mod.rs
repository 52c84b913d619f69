//! WebSocket module for Overdraw
//!
//! Provides real-time endpoints:
//! - /draw - producers streaming draw events
//! - /view - viewers receiving rendered frames

pub mod draw;
pub mod view;

pub use draw::draw_handler;
pub use view::view_handler;

use axum::{routing::get, Router};

/// Create the WebSocket router
pub fn websocket_router() -> Router {
    Router::new()
        .route("/draw", get(draw_handler))
        .route("/view", get(view_handler))
}
