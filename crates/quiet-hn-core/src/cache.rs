use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::{ItemId, ItemRecord};

/// Process-wide memo of fetched items. Entries are never evicted or replaced
/// with different content: records for an id are assumed stable, so a second
/// insert for the same id only overwrites an identical value.
///
/// Clones share the same underlying table.
#[derive(Debug, Clone, Default)]
pub struct SharedItemCache {
    entries: Arc<RwLock<HashMap<ItemId, ItemRecord>>>,
}

impl SharedItemCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Readers share the lock and never block each other.
    #[must_use]
    pub fn lookup(&self, id: ItemId) -> Option<ItemRecord> {
        self.entries.read().get(&id).cloned()
    }

    /// Last write wins.
    pub fn insert(&self, id: ItemId, record: ItemRecord) {
        self.entries.write().insert(id, record);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
