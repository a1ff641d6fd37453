//! Segment cost cache.
//!
//! Walking track element by element between decision points is the
//! expensive part of a search. Each completed segment is stored here, keyed
//! by its first position, so later searches over the same topology need one
//! probe per decision point instead of a full walk.
//!
//! Entries never expire. The owner must call `clear` whenever track or
//! signal layout changes in the area the cache covers, because stale costs
//! cannot be detected from the cache alone.

use std::collections::HashMap;

use moka::sync::Cache as MokaCache;
use serde::Deserialize;

use crate::domain::PathPos;
use crate::planner::Segment;

/// Storage used by the planner for segment costs.
pub trait SegmentStore {
    /// Get the segment starting at `key`.
    fn lookup(&self, key: &PathPos) -> Option<Segment>;

    /// Insert or overwrite the segment starting at `key`.
    fn insert(&mut self, key: PathPos, segment: Segment);

    /// Drop every entry.
    fn clear(&mut self);

    /// Number of cached segments.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Configuration for segment caches.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Number of segments to pre-allocate room for.
    pub initial_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
        }
    }
}

/// Hit/miss counters, kept by the evaluator that probes the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Segment cache for one routing context, used from a single thread.
#[derive(Debug, Default)]
pub struct SegmentCache {
    segments: HashMap<PathPos, Segment>,
}

impl SegmentCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            segments: HashMap::with_capacity(config.initial_capacity),
        }
    }

    /// Borrow an entry in place.
    pub fn peek(&self, key: &PathPos) -> Option<&Segment> {
        self.segments.get(key)
    }
}

impl SegmentStore for SegmentCache {
    fn lookup(&self, key: &PathPos) -> Option<Segment> {
        self.segments.get(key).copied()
    }

    fn insert(&mut self, key: PathPos, segment: Segment) {
        self.segments.insert(key, segment);
    }

    fn clear(&mut self) {
        self.segments.clear();
    }

    fn len(&self) -> usize {
        self.segments.len()
    }
}

/// Segment cache shared between threads.
///
/// Clones are handles to the same store, so independent searches for one
/// routing context (e.g. both directions of a train) can run in parallel and
/// still fill a single cache. Unbounded, like [`SegmentCache`].
#[derive(Clone)]
pub struct SharedSegmentCache {
    segments: MokaCache<PathPos, Segment>,
}

impl SharedSegmentCache {
    /// Create a new shared cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let segments = MokaCache::builder()
            .initial_capacity(config.initial_capacity)
            .build();
        Self { segments }
    }

    /// Apply pending bookkeeping so `len` is exact.
    pub fn sync(&self) {
        self.segments.run_pending_tasks();
    }
}

impl SegmentStore for SharedSegmentCache {
    fn lookup(&self, key: &PathPos) -> Option<Segment> {
        self.segments.get(key)
    }

    fn insert(&mut self, key: PathPos, segment: Segment) {
        self.segments.insert(key, segment);
    }

    fn clear(&mut self) {
        self.segments.invalidate_all();
        self.segments.run_pending_tasks();
    }

    /// May lag behind recent inserts until [`SharedSegmentCache::sync`] runs.
    fn len(&self) -> usize {
        self.segments.entry_count() as usize
    }
}
