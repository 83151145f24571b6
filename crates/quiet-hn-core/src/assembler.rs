use serde::Serialize;

use crate::{CompletionStream, ItemId, ItemRecord, RankedItem};

/// Final output of one aggregation: at most `target_count` records in
/// ascending rank order.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ResultSet {
    records: Vec<ItemRecord>,
}

impl ResultSet {
    #[must_use]
    pub fn records(&self) -> &[ItemRecord] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<ItemRecord> {
        self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn ids(&self) -> Vec<ItemId> {
        self.records.iter().map(|record| record.id).collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrderAssembler {
    target_count: usize,
}

impl OrderAssembler {
    #[must_use]
    pub fn new(target_count: usize) -> Self {
        Self { target_count }
    }

    /// Drain `stream` until the coordinator closes it, then restore rank order.
    pub async fn assemble(&self, mut stream: CompletionStream) -> ResultSet {
        let mut arrived = Vec::new();
        while let Some(item) = stream.recv().await {
            arrived.push(item);
        }
        self.order(arrived)
    }

    /// Sort by rank index and keep the first `target_count`. Arrival order is
    /// irrelevant; indices are unique within one request.
    #[must_use]
    pub fn order(&self, mut arrived: Vec<RankedItem>) -> ResultSet {
        arrived.sort_unstable_by_key(|item| item.rank_index);
        arrived.truncate(self.target_count);
        ResultSet { records: arrived.into_iter().map(|item| item.record).collect() }
    }
}
