//! Per-path debouncing of change events.
//!
//! Editors often save a file several times in quick succession. Each new
//! event for a path pushes its deadline back, so one change is dispatched
//! once the path has been quiet for the debounce duration.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use super::events::EventType;

#[derive(Debug, Clone, Copy)]
struct Pending {
    last_change: Instant,
    kind: EventType,
}

/// Debounces change events by path.
#[derive(Debug)]
pub struct Debouncer {
    pending: HashMap<PathBuf, Pending>,
    duration: Duration,
}

impl Debouncer {
    /// Create a debouncer with the given quiet period.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            pending: HashMap::new(),
            duration,
        }
    }

    /// Record a change, resetting the timer for this path.
    ///
    /// The most recent event kind wins.
    pub fn record(&mut self, path: PathBuf, kind: EventType) {
        self.record_at(path, kind, Instant::now());
    }

    fn record_at(&mut self, path: PathBuf, kind: EventType, now: Instant) {
        self.pending.insert(
            path,
            Pending {
                last_change: now,
                kind,
            },
        );
    }

    /// Take all paths that have been quiet for the debounce duration.
    pub fn take_ready(&mut self) -> Vec<(PathBuf, EventType)> {
        self.take_ready_at(Instant::now())
    }

    fn take_ready_at(&mut self, now: Instant) -> Vec<(PathBuf, EventType)> {
        let mut ready = Vec::new();

        self.pending.retain(|path, pending| {
            if now.duration_since(pending.last_change) >= self.duration {
                ready.push((path.clone(), pending.kind));
                false
            } else {
                true
            }
        });

        ready
    }

    /// When the earliest pending path becomes ready.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending
            .values()
            .map(|p| p.last_change + self.duration)
            .min()
    }

    /// Check if there are any pending changes.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Get the number of pending changes.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
