//! Overdraw Core - Live Stroke Engine
//!
//! This crate maintains the authoritative in-memory set of strokes being
//! drawn by many concurrent remote producers:
//! - Stroke: keys, points, draw events and live stroke records
//! - Queue: unbounded multi-producer event hand-off
//! - Registry: the mutex-guarded collection of live strokes
//! - Watchdog: per-stroke idle eviction
//! - Ingest: the single consumer that serializes registry mutation
//! - Notifier: coalescing redraw signal
//! - Engine: wiring, lifecycle and the public boundary
//! - Render: snapshot to pixel draw operations, redraw relay
//!
//! ## Usage
//!
//! ```ignore
//! use overdraw_core::{DrawEngine, DrawEvent, EngineConfig, Point, StrokeKey};
//!
//! let engine = DrawEngine::start(EngineConfig::default());
//! engine.submit(DrawEvent::new(StrokeKey::new(1, 255, 0, 0), Point::new(0.1, 0.1)))?;
//! engine.flush().await?;
//! assert_eq!(engine.snapshot().await.len(), 1);
//! ```
//!
//! ## Configuration
//!
//! ```toml
//! [strokes]
//! idle_timeout_secs = 10
//! point_capacity = 100
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod engine;
pub mod error;
pub mod ingest;
pub mod notifier;
pub mod queue;
pub mod registry;
pub mod render;
pub mod stroke;
pub mod watchdog;

// Re-export main types
pub use engine::{DrawEngine, EngineConfig};
pub use error::{Error, Result};
pub use ingest::{Ingested, IngestionLoop};
pub use notifier::{RedrawListener, RedrawNotifier};
pub use queue::{event_queue, EventReceiver, EventSender};
pub use registry::{StrokeRegistry, StrokeTable};
pub use render::{plan, spawn_redraw_relay, DrawOp, Pen, Rgba, Surface};
pub use stroke::{DrawEvent, Point, Stroke, StrokeKey, StrokeSnapshot};
pub use watchdog::{Watchdog, WatchdogExit};
