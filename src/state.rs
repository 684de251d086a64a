use std::collections::HashMap;

use crate::types::{PlayerHandle, PlayerSnapshot};

/// Last observed snapshot per monitored player.
///
/// Owned by the poll loop; snapshots are only ever replaced whole.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    snapshots: HashMap<PlayerHandle, PlayerSnapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, player: &str) -> Option<&PlayerSnapshot> {
        self.snapshots.get(player)
    }

    /// Replace the stored snapshot, returning the previous one.
    pub fn put(&mut self, player: &str, snapshot: PlayerSnapshot) -> Option<PlayerSnapshot> {
        self.snapshots.insert(player.to_string(), snapshot)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
