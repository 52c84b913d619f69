//! Stroke Registry
//!
//! The single shared collection of live strokes. Every read and write goes
//! through one exclusive lock; callers take the lock with
//! [`StrokeRegistry::lock`] and run a whole lookup-then-mutate sequence on the
//! returned [`StrokeTable`] before releasing it.

use std::collections::HashMap;
use tokio::sync::{Mutex, MutexGuard};
use tracing::trace;

use crate::error::{Error, Result};
use crate::stroke::{Point, Stroke, StrokeKey, StrokeSnapshot};

/// Default initial point buffer per stroke
pub const DEFAULT_POINT_CAPACITY: usize = 100;

/// Live strokes keyed by identity.
///
/// Only reachable through a held [`StrokeRegistry`] lock.
#[derive(Debug)]
pub struct StrokeTable {
    strokes: HashMap<StrokeKey, Stroke>,
    next_generation: u64,
    point_capacity: usize,
}

impl StrokeTable {
    fn new(point_capacity: usize) -> Self {
        Self {
            strokes: HashMap::new(),
            next_generation: 0,
            point_capacity,
        }
    }

    /// Look up the live stroke for a key
    #[must_use]
    pub fn find_by_key(&self, key: &StrokeKey) -> Option<&Stroke> {
        self.strokes.get(key)
    }

    /// Start a new stroke holding one point.
    ///
    /// Fails if the key already has a live stroke.
    pub fn insert(&mut self, key: StrokeKey, first: Point) -> Result<&Stroke> {
        if self.strokes.contains_key(&key) {
            return Err(Error::StrokeExists(key));
        }

        let generation = self.next_generation;
        self.next_generation += 1;

        let stroke = Stroke::new(key, generation, first, self.point_capacity);
        trace!(key = %key, generation, "Stroke inserted");
        Ok(&*self.strokes.entry(key).or_insert(stroke))
    }

    /// Append a point to a live stroke
    pub fn append_point(&mut self, key: &StrokeKey, point: Point) -> Result<&Stroke> {
        let stroke = self
            .strokes
            .get_mut(key)
            .ok_or(Error::StrokeNotFound(*key))?;
        stroke.push(point);
        Ok(&*stroke)
    }

    /// Remove whatever stroke is live for a key
    pub fn remove(&mut self, key: &StrokeKey) -> Option<Stroke> {
        self.strokes.remove(key)
    }

    /// Remove the stroke for `key` only if it is still the given session.
    ///
    /// A stale caller holding an older generation leaves a newer stroke
    /// with the same key alone.
    pub fn remove_generation(&mut self, key: &StrokeKey, generation: u64) -> Option<Stroke> {
        match self.strokes.get(key) {
            Some(stroke) if stroke.generation() == generation => self.strokes.remove(key),
            _ => None,
        }
    }

    /// Copy all live strokes in creation order
    #[must_use]
    pub fn snapshot(&self) -> Vec<StrokeSnapshot> {
        let mut strokes: Vec<&Stroke> = self.strokes.values().collect();
        strokes.sort_by_key(|s| s.generation());
        strokes.into_iter().map(Stroke::snapshot).collect()
    }

    /// Number of live strokes
    #[must_use]
    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    /// No live strokes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Drop every stroke, returning how many were live
    pub fn clear(&mut self) -> usize {
        let count = self.strokes.len();
        self.strokes.clear();
        count
    }
}

/// Shared registry of live strokes behind a single exclusive lock
#[derive(Debug)]
pub struct StrokeRegistry {
    table: Mutex<StrokeTable>,
}

impl StrokeRegistry {
    /// Create an empty registry with the default point capacity
    #[must_use]
    pub fn new() -> Self {
        Self::with_point_capacity(DEFAULT_POINT_CAPACITY)
    }

    /// Create an empty registry whose strokes preallocate `capacity` points
    #[must_use]
    pub fn with_point_capacity(capacity: usize) -> Self {
        Self {
            table: Mutex::new(StrokeTable::new(capacity)),
        }
    }

    /// Take the registry lock.
    ///
    /// Hold the guard only for non-blocking work.
    pub async fn lock(&self) -> MutexGuard<'_, StrokeTable> {
        self.table.lock().await
    }

    /// Copy all live strokes in creation order
    pub async fn snapshot(&self) -> Vec<StrokeSnapshot> {
        self.lock().await.snapshot()
    }

    /// Number of live strokes
    pub async fn len(&self) -> usize {
        self.lock().await.len()
    }

    /// No live strokes
    pub async fn is_empty(&self) -> bool {
        self.lock().await.is_empty()
    }
}

impl Default for StrokeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
