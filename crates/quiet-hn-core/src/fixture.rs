//! Deterministic in-process providers.
//!
//! They stand in for the network-backed providers in tests, benches and
//! offline runs: every fetch is counted, and individual items can be made to
//! fail or to answer after a delay so completion order differs from rank order.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{ItemId, ItemProvider, ItemRecord, ProviderError, RankingProvider};

#[derive(Debug, Default)]
pub struct FixtureItems {
    records: HashMap<ItemId, ItemRecord>,
    failing: HashSet<ItemId>,
    delays: HashMap<ItemId, Duration>,
    fetches: Mutex<HashMap<ItemId, usize>>,
    total_fetches: AtomicUsize,
}

impl FixtureItems {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_record(mut self, record: ItemRecord) -> Self {
        self.records.insert(record.id, record);
        self
    }

    #[must_use]
    pub fn with_records(mut self, records: impl IntoIterator<Item = ItemRecord>) -> Self {
        for record in records {
            self.records.insert(record.id, record);
        }
        self
    }

    /// Every fetch of `id` fails with a transport error.
    #[must_use]
    pub fn failing(mut self, id: ItemId) -> Self {
        self.failing.insert(id);
        self
    }

    /// Fetches of `id` answer only after `delay`.
    #[must_use]
    pub fn delayed(mut self, id: ItemId, delay: Duration) -> Self {
        self.delays.insert(id, delay);
        self
    }

    #[must_use]
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    #[must_use]
    pub fn fetch_count(&self, id: ItemId) -> usize {
        self.fetches.lock().get(&id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total_fetches(&self) -> usize {
        self.total_fetches.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn fetched_ids(&self) -> HashSet<ItemId> {
        self.fetches.lock().keys().copied().collect()
    }
}

#[async_trait]
impl ItemProvider for FixtureItems {
    async fn fetch(&self, id: ItemId) -> Result<ItemRecord, ProviderError> {
        *self.fetches.lock().entry(id).or_insert(0) += 1;
        self.total_fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(&id) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(&id) {
            return Err(ProviderError::Transport(format!("fixture failure for item {id}")));
        }
        self.records.get(&id).cloned().ok_or(ProviderError::NotFound(id))
    }
}

/// A fixed ranking, or a ranking source that is always down.
#[derive(Debug, Clone)]
pub struct FixtureRanking {
    ids: Option<Vec<ItemId>>,
}

impl FixtureRanking {
    #[must_use]
    pub fn new(ids: impl IntoIterator<Item = u64>) -> Self {
        Self { ids: Some(ids.into_iter().map(ItemId).collect()) }
    }

    #[must_use]
    pub fn unavailable() -> Self {
        Self { ids: None }
    }
}

#[async_trait]
impl RankingProvider for FixtureRanking {
    async fn top(&self) -> Result<Vec<ItemId>, ProviderError> {
        self.ids
            .clone()
            .ok_or_else(|| ProviderError::Transport("ranking source unavailable".to_string()))
    }
}

/// A linkable story record for `id`.
#[must_use]
pub fn story(id: u64) -> ItemRecord {
    ItemRecord {
        id: ItemId(id),
        item_type: "story".to_string(),
        url: Some(format!("https://www.example.com/stories/{id}")),
        title: Some(format!("Story {id}")),
        by: Some("fixture".to_string()),
        score: 100,
        time: 1_700_000_000,
        ..ItemRecord::default()
    }
}

/// A record that fails the story-link predicate.
#[must_use]
pub fn comment(id: u64) -> ItemRecord {
    ItemRecord {
        id: ItemId(id),
        item_type: "comment".to_string(),
        by: Some("fixture".to_string()),
        text: Some(format!("Comment {id}")),
        time: 1_700_000_000,
        ..ItemRecord::default()
    }
}
