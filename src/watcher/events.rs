//! Change event types and the in-flight event ledger.

#![allow(clippy::missing_const_for_fn)]

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};
use parking_lot::Mutex;

/// Kind of change dispatched to the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// File was created or written.
    Update,
    /// File was removed or renamed away.
    Remove,
}

impl EventType {
    /// Map a raw notification kind to a change type.
    ///
    /// Returns `None` for kinds that do not change content (access,
    /// metadata).
    #[must_use]
    pub fn from_kind(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                Some(Self::Update)
            }
            EventKind::Modify(ModifyKind::Name(_)) | EventKind::Remove(_) => Some(Self::Remove),
            EventKind::Modify(ModifyKind::Metadata(_)) => None,
            EventKind::Modify(_) => Some(Self::Update),
            EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Update => f.write_str("update"),
            Self::Remove => f.write_str("remove"),
        }
    }
}

/// Split a raw notification into per-path changes.
///
/// A rename carrying both endpoints removes the source and updates the
/// destination.
#[must_use]
pub fn changes(event: &Event) -> Vec<(PathBuf, EventType)> {
    if let EventKind::Modify(ModifyKind::Name(RenameMode::Both)) = event.kind {
        if let [from, to] = event.paths.as_slice() {
            return vec![
                (from.clone(), EventType::Remove),
                (to.clone(), EventType::Update),
            ];
        }
    }

    EventType::from_kind(&event.kind).map_or_else(Vec::new, |kind| {
        event.paths.iter().map(|p| (p.clone(), kind)).collect()
    })
}

/// Counts change notifications per path until they are flushed.
#[derive(Debug, Default)]
pub struct EventLedger {
    events: Mutex<HashMap<PathBuf, usize>>,
}

impl EventLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one notification for `path`.
    pub fn record(&self, path: impl Into<PathBuf>) {
        *self.events.lock().entry(path.into()).or_insert(0) += 1;
    }

    /// Number of distinct paths with pending notifications.
    #[must_use]
    pub fn count(&self) -> usize {
        self.events.lock().len()
    }

    /// Total notifications recorded across all paths.
    #[must_use]
    pub fn total(&self) -> usize {
        self.events.lock().values().sum()
    }

    /// Notifications recorded for one path.
    #[must_use]
    pub fn occurrences(&self, path: &Path) -> usize {
        self.events.lock().get(path).copied().unwrap_or(0)
    }

    /// Forget a flushed path, returning how many notifications it had.
    pub fn remove(&self, path: &Path) -> usize {
        self.events.lock().remove(path).unwrap_or(0)
    }

    /// Forget everything.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}
