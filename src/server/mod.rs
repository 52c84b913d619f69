//! Server module for Overdraw
//!
//! Hosts the draw engine behind HTTP and WebSocket endpoints.
//!
//! # Module Structure
//!
//! - `config`: Configuration structures
//! - `loader`: Configuration loading from files and environment
//! - `validation`: Startup configuration checks
//! - `state`: State shared with handlers
//! - `signal`: Ctrl+C / SIGTERM handling
//! - `init`: Router assembly and the main run loop

pub mod config;
mod init;
mod loader;
mod signal;
mod state;
mod validation;

// Re-export public API
pub use init::run;
pub use loader::load_config;
pub use state::AppState;
