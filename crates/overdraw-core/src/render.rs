//! Render planning and the redraw relay
//!
//! A renderer never reads the registry directly. It waits for redraw advice,
//! takes a snapshot and turns it into pixel draw operations: one dot for a
//! single-point stroke, otherwise a segment between each pair of consecutive
//! points, with normalized coordinates scaled to the surface size.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::engine::DrawEngine;
use crate::stroke::{Point, StrokeSnapshot};

/// Default pen width in pixels
pub const DEFAULT_PEN_WIDTH: f32 = 10.0;
/// Default pen alpha
pub const DEFAULT_PEN_ALPHA: u8 = 128;

/// Pen applied to every stroke; colour comes from the stroke key
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pen {
    /// Line width in pixels
    pub width: f32,
    /// Alpha applied on top of the stroke colour
    pub alpha: u8,
}

impl Default for Pen {
    fn default() -> Self {
        Self {
            width: DEFAULT_PEN_WIDTH,
            alpha: DEFAULT_PEN_ALPHA,
        }
    }
}

/// RGBA colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha
    pub a: u8,
}

/// One pixel-space drawing primitive (round cap, round join)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    /// Erase the whole surface
    Clear,
    /// Dot for a single-point stroke
    Point {
        /// Pixel x
        x: i32,
        /// Pixel y
        y: i32,
        /// Pen colour
        color: Rgba,
        /// Pen width
        width: f32,
    },
    /// Segment between two consecutive stroke points
    Line {
        /// Start x
        x1: i32,
        /// Start y
        y1: i32,
        /// End x
        x2: i32,
        /// End y
        y2: i32,
        /// Pen colour
        color: Rgba,
        /// Pen width
        width: f32,
    },
}

/// Scale a normalized point to pixels, truncating toward zero
#[must_use]
pub fn to_pixels(point: Point, width: u32, height: u32) -> (i32, i32) {
    (
        (point.x * f64::from(width)) as i32,
        (point.y * f64::from(height)) as i32,
    )
}

/// Build the full repaint for a snapshot on a `width` x `height` surface.
///
/// Always starts with [`DrawOp::Clear`]; strokes are painted in snapshot
/// order.
#[must_use]
pub fn plan(strokes: &[StrokeSnapshot], width: u32, height: u32, pen: Pen) -> Vec<DrawOp> {
    let mut ops = Vec::with_capacity(1 + strokes.iter().map(|s| s.points.len()).sum::<usize>());
    ops.push(DrawOp::Clear);

    for stroke in strokes {
        let (r, g, b) = stroke.key.color();
        let color = Rgba {
            r,
            g,
            b,
            a: pen.alpha,
        };

        match stroke.points.as_slice() {
            [] => {}
            [only] => {
                let (x, y) = to_pixels(*only, width, height);
                ops.push(DrawOp::Point {
                    x,
                    y,
                    color,
                    width: pen.width,
                });
            }
            points => {
                for pair in points.windows(2) {
                    let (x1, y1) = to_pixels(pair[0], width, height);
                    let (x2, y2) = to_pixels(pair[1], width, height);
                    ops.push(DrawOp::Line {
                        x1,
                        y1,
                        x2,
                        y2,
                        color,
                        width: pen.width,
                    });
                }
            }
        }
    }

    ops
}

/// A paintable target, such as a window or a remote viewer
#[cfg_attr(test, mockall::automock)]
pub trait Surface: Send {
    /// Current size in pixels
    fn size(&self) -> (u32, u32);

    /// Replace the surface contents with `ops`
    fn repaint(&mut self, ops: &[DrawOp]);
}

/// Paint the current snapshot onto `surface` once
pub fn paint<S: Surface + ?Sized>(surface: &mut S, strokes: &[StrokeSnapshot], pen: Pen) {
    let (width, height) = surface.size();
    let ops = plan(strokes, width, height, pen);
    trace!(ops = ops.len(), width, height, "Repainting surface");
    surface.repaint(&ops);
}

/// Spawn the task that repaints `surface` on every coalesced redraw advice.
///
/// Paints once immediately, then once per wake-up. Ends when the engine
/// shuts down or is dropped, and drops `surface` on the way out so anything
/// fed by it sees the end of the stream. The repaint runs on this task,
/// never on the ingestion loop.
pub fn spawn_redraw_relay<S>(engine: &DrawEngine, mut surface: S, pen: Pen) -> JoinHandle<()>
where
    S: Surface + 'static,
{
    let registry = Arc::clone(engine.registry());
    let mut redraws = engine.subscribe();
    let cancel = engine.child_token();

    tokio::spawn(async move {
        paint(&mut surface, &registry.snapshot().await, pen);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                epoch = redraws.changed() => {
                    let Some(epoch) = epoch else { break };
                    let strokes = registry.snapshot().await;
                    trace!(epoch, strokes = strokes.len(), "Redraw");
                    paint(&mut surface, &strokes, pen);
                }
            }
        }

        drop(surface);
        debug!("Redraw relay stopped");
    })
}
