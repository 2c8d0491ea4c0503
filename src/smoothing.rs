//! Smoothing cache for CPU percent.
//!
//! Each pid maps to its last smoothed CPU percent and the generation (pass
//! number) in which it was last written. Entries not touched during the
//! current generation are evicted by [`SmoothingCache::evict_stale`].

use ahash::AHashMap as HashMap;

/// Cached smoothed value for a single pid.
#[derive(Debug, Clone, Copy)]
struct SmoothEntry {
    value: f64,
    generation: u64,
}

/// Per-pid smoothing state, bounded by generation-based eviction.
#[derive(Debug, Default)]
pub struct SmoothingCache {
    entries: HashMap<u32, SmoothEntry>,
    generation: u64,
}

impl SmoothingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new pass. Returns the new generation number.
    pub fn begin_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Folds `instant` into the smoothed value for `pid` and returns it.
    ///
    /// `smoothed = (instant + previous) / 2`, where `previous` defaults to
    /// `instant` for a pid without an entry.
    pub fn smooth(&mut self, pid: u32, instant: f64) -> f64 {
        let previous = self
            .entries
            .get(&pid)
            .map(|e| e.value)
            .unwrap_or(instant);
        let smoothed = (instant + previous) / 2.0;
        self.entries.insert(
            pid,
            SmoothEntry {
                value: smoothed,
                generation: self.generation,
            },
        );
        smoothed
    }

    pub fn get(&self, pid: u32) -> Option<f64> {
        self.entries.get(&pid).map(|e| e.value)
    }

    /// Drops every entry not written during the current generation.
    /// Returns how many entries were removed.
    pub fn evict_stale(&mut self) -> usize {
        let current = self.generation;
        let before = self.entries.len();
        self.entries.retain(|_, e| e.generation == current);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
