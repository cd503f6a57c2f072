//! Optimistic status cache.
//!
//! Each example's cached snapshot is either `Confirmed` (matches the last
//! authoritative server response) or `Pending` (an optimistic local update
//! awaiting confirmation, with the last confirmed snapshot kept for
//! rollback). This replaces ad-hoc field overwrites with an explicit
//! two-state machine: confirm/commit moves to `Confirmed`, rollback reverts
//! a `Pending` entry to its last known-good state.

use std::collections::HashMap;

use pecha_core::types::DbId;
use pecha_core::view::TrackingSnapshot;

#[derive(Debug, Clone)]
enum CacheEntry {
    /// Matches the last authoritative server response.
    Confirmed(TrackingSnapshot),
    /// A local optimistic update awaiting backend confirmation.
    Pending {
        optimistic: TrackingSnapshot,
        last_confirmed: Option<TrackingSnapshot>,
    },
}

/// Per-example snapshot cache with explicit optimistic state.
#[derive(Debug, Default)]
pub struct StatusCache {
    entries: HashMap<DbId, CacheEntry>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The snapshot a UI should currently display: the optimistic view while
    /// pending, the confirmed one otherwise.
    pub fn get(&self, example_id: DbId) -> Option<&TrackingSnapshot> {
        self.entries.get(&example_id).map(|entry| match entry {
            CacheEntry::Confirmed(snapshot) => snapshot,
            CacheEntry::Pending { optimistic, .. } => optimistic,
        })
    }

    /// True while an optimistic update awaits confirmation.
    pub fn is_pending(&self, example_id: DbId) -> bool {
        matches!(
            self.entries.get(&example_id),
            Some(CacheEntry::Pending { .. })
        )
    }

    /// Store an authoritative snapshot, clearing any pending state.
    pub fn confirm(&mut self, snapshot: TrackingSnapshot) {
        self.entries
            .insert(snapshot.example_id, CacheEntry::Confirmed(snapshot));
    }

    /// Apply an optimistic update, keeping the last confirmed snapshot for
    /// rollback. A second optimistic update before confirmation keeps the
    /// original rollback point.
    pub fn begin_optimistic(&mut self, snapshot: TrackingSnapshot) {
        let example_id = snapshot.example_id;
        let last_confirmed = match self.entries.remove(&example_id) {
            Some(CacheEntry::Confirmed(confirmed)) => Some(confirmed),
            Some(CacheEntry::Pending { last_confirmed, .. }) => last_confirmed,
            None => None,
        };
        self.entries.insert(
            example_id,
            CacheEntry::Pending {
                optimistic: snapshot,
                last_confirmed,
            },
        );
    }

    /// Revert a pending entry to its last confirmed snapshot. With no known
    /// good state the entry is dropped entirely, forcing a re-fetch.
    pub fn rollback(&mut self, example_id: DbId) {
        if let Some(CacheEntry::Pending { last_confirmed, .. }) = self.entries.remove(&example_id)
        {
            if let Some(confirmed) = last_confirmed {
                self.entries
                    .insert(example_id, CacheEntry::Confirmed(confirmed));
            }
        }
    }

    /// Drop an example's cached state (e.g. on navigation away).
    pub fn invalidate(&mut self, example_id: DbId) {
        self.entries.remove(&example_id);
    }

    /// Drop everything (e.g. on logout).
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
