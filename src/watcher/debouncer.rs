//! Subtree-coalescing debounce logic for filesystem events.
//!
//! A single logical edit (an editor save-in-place, a directory move)
//! emits several raw events across milliseconds. Recording them here
//! delays action until a path has been quiet for the configured window,
//! and merges bursts by subtree: an event under an already-pending
//! directory refreshes that directory's timer instead of queueing a
//! second job, and recording a directory absorbs its pending
//! descendants.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Debounces sync jobs keyed by covering path.
#[derive(Debug)]
pub struct Debouncer {
    /// Pending jobs: covering path -> last event timestamp.
    pending: HashMap<PathBuf, Instant>,
    /// How long a path must be quiet before processing.
    duration: Duration,
}

impl Debouncer {
    /// Create a new debouncer with the given duration in milliseconds.
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            pending: HashMap::new(),
            duration: Duration::from_millis(debounce_ms),
        }
    }

    /// Record an event for `path`.
    ///
    /// If a pending job already covers an ancestor of `path` (or the
    /// path itself), that job's timer is refreshed and no new job is
    /// queued. Otherwise pending jobs underneath `path` are merged into
    /// it and its timer starts.
    pub fn record(&mut self, path: PathBuf) {
        if let Some(ancestor) = self
            .pending
            .keys()
            .find(|pending| path.starts_with(pending))
            .cloned()
        {
            self.pending.insert(ancestor, Instant::now());
            return;
        }

        self.pending.retain(|pending, _| !pending.starts_with(&path));
        self.pending.insert(path, Instant::now());
    }

    /// Remove the pending job for exactly `path`, if any.
    pub fn remove(&mut self, path: &Path) {
        self.pending.remove(path);
    }

    /// Drop every pending job at or under `path`. Used when a directory
    /// is deleted: queued descendant events must not fire afterwards.
    pub fn remove_subtree(&mut self, path: &Path) {
        self.pending.retain(|pending, _| !pending.starts_with(path));
    }

    /// Take all paths that have been quiet for the debounce duration.
    ///
    /// Returns paths ready for syncing and removes them from pending.
    pub fn take_ready(&mut self) -> Vec<PathBuf> {
        let now = Instant::now();
        let mut ready = Vec::new();

        self.pending.retain(|path, last_event| {
            if now.duration_since(*last_event) >= self.duration {
                ready.push(path.clone());
                false
            } else {
                true
            }
        });

        ready
    }

    /// Check if there are any pending jobs.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
