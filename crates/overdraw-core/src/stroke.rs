//! Stroke data model
//!
//! Keys, points and draw events as they arrive from producers, plus the
//! [`Stroke`] record the registry owns while a stroke is live.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Notify;

use crate::error::{Error, Result};

/// Identity of a logical stroke: producer-chosen id plus pen colour.
///
/// Producers reuse ids across drawing sessions, so the colour is part of the
/// key. Two events belong to the same stroke iff all four fields match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrokeKey {
    /// Producer-chosen stroke id
    pub id: i64,
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl StrokeKey {
    /// Create a key from id and colour
    #[must_use]
    pub const fn new(id: i64, r: u8, g: u8, b: u8) -> Self {
        Self { id, r, g, b }
    }

    /// Colour triple of this key
    #[must_use]
    pub const fn color(&self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }
}

impl fmt::Display for StrokeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:02x}{:02x}{:02x}", self.id, self.r, self.g, self.b)
    }
}

/// Normalized surface coordinate, `[0, 1]` on both axes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Fraction of surface width
    pub x: f64,
    /// Fraction of surface height
    pub y: f64,
}

impl Point {
    /// Create a point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates are finite numbers
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One point-append request.
///
/// On the wire this is the flat object
/// `{"id": 1, "r": 255, "g": 0, "b": 0, "x": 0.1, "y": 0.1}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawEvent {
    /// Stroke the point belongs to
    #[serde(flatten)]
    pub key: StrokeKey,
    /// The point to append
    #[serde(flatten)]
    pub point: Point,
}

impl DrawEvent {
    /// Create an event
    #[must_use]
    pub const fn new(key: StrokeKey, point: Point) -> Self {
        Self { key, point }
    }

    /// Decode and validate a wire payload
    pub fn from_json(text: &str) -> Result<Self> {
        let event: Self = serde_json::from_str(text)?;
        event.validate()?;
        Ok(event)
    }

    /// Reject events the engine must never see
    pub fn validate(&self) -> Result<()> {
        if !self.point.is_finite() {
            return Err(Error::invalid_event(format!(
                "non-finite coordinates ({}, {}) for stroke {}",
                self.point.x, self.point.y, self.key
            )));
        }
        Ok(())
    }
}

/// A live stroke owned by the registry.
///
/// The point list only ever grows. `generation` identifies this particular
/// session of the key; a later stroke with the same key gets a new one.
#[derive(Debug)]
pub struct Stroke {
    key: StrokeKey,
    generation: u64,
    points: Vec<Point>,
    created_at: DateTime<Utc>,
    keep_alive: Arc<Notify>,
}

impl Stroke {
    pub(crate) fn new(key: StrokeKey, generation: u64, first: Point, capacity: usize) -> Self {
        let mut points = Vec::with_capacity(capacity.max(1));
        points.push(first);
        Self {
            key,
            generation,
            points,
            created_at: Utc::now(),
            keep_alive: Arc::new(Notify::new()),
        }
    }

    /// Stroke identity
    #[must_use]
    pub fn key(&self) -> StrokeKey {
        self.key
    }

    /// Registry-assigned session number
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Points in draw order
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// When the first point arrived
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Reset this stroke's idle timer. Never blocks: at most one pending
    /// signal is stored, repeated signals collapse into it.
    pub(crate) fn keep_alive(&self) {
        self.keep_alive.notify_one();
    }

    pub(crate) fn keep_alive_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.keep_alive)
    }

    /// Owned copy for renderers
    #[must_use]
    pub fn snapshot(&self) -> StrokeSnapshot {
        StrokeSnapshot {
            key: self.key,
            generation: self.generation,
            created_at: self.created_at,
            points: self.points.clone(),
        }
    }
}

/// Read-only copy of a stroke taken under the registry lock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeSnapshot {
    /// Stroke identity
    #[serde(flatten)]
    pub key: StrokeKey,
    /// Session number, increasing in creation order
    pub generation: u64,
    /// When the first point arrived
    pub created_at: DateTime<Utc>,
    /// Points in draw order
    pub points: Vec<Point>,
}
