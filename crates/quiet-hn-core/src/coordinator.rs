use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::{
    AggregationConfig, ItemId, ItemProvider, ItemRecord, OrderAssembler, Predicate,
    RankedIdentifierList, ResultSet, SharedItemCache,
};

/// A predicate-passing record tagged with its position in the ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedItem {
    pub record: ItemRecord,
    pub rank_index: usize,
}

/// Arrivals from fetch tasks in completion order. Ends once every task of the
/// request has terminated.
#[derive(Debug)]
pub struct CompletionStream {
    receiver: mpsc::UnboundedReceiver<RankedItem>,
}

impl CompletionStream {
    pub async fn recv(&mut self) -> Option<RankedItem> {
        self.receiver.recv().await
    }
}

/// Fans a ranking out to one fetch task per working-set identifier.
#[derive(Clone)]
pub struct FetchCoordinator {
    cache: SharedItemCache,
    items: Arc<dyn ItemProvider>,
    config: AggregationConfig,
}

impl std::fmt::Debug for FetchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchCoordinator")
            .field("cached_items", &self.cache.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FetchCoordinator {
    #[must_use]
    pub fn new(
        cache: SharedItemCache,
        items: Arc<dyn ItemProvider>,
        config: AggregationConfig,
    ) -> Self {
        Self { cache, items, config }
    }

    #[must_use]
    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    #[must_use]
    pub fn cache(&self) -> &SharedItemCache {
        &self.cache
    }

    /// Spawn fetch tasks for the working set of `ranked` and return the stream
    /// their matches arrive on.
    ///
    /// Must be called from within a Tokio runtime. Tasks are detached: they run
    /// to completion even if the returned stream is dropped.
    #[must_use]
    pub fn start(&self, ranked: &RankedIdentifierList, predicate: Predicate) -> CompletionStream {
        let working_set = ranked.working_set(self.config.working_set_size(ranked.len()));
        tracing::debug!(
            ranked = ranked.len(),
            working_set = working_set.len(),
            target_count = self.config.target_count,
            "starting fetch fan-out"
        );

        let (sender, receiver) = mpsc::unbounded_channel();
        let mut tasks = JoinSet::new();
        for (rank_index, &id) in working_set.iter().enumerate() {
            let cache = self.cache.clone();
            let items = Arc::clone(&self.items);
            let predicate = Arc::clone(&predicate);
            let sender = sender.clone();
            tasks.spawn(async move {
                let Some(record) = resolve(&cache, items.as_ref(), id).await else {
                    return;
                };
                if (*predicate)(&record) {
                    // Send only fails once the caller dropped the stream.
                    let _ = sender.send(RankedItem { record, rank_index });
                }
            });
        }

        // The supervisor holds the last sender, so the stream closes only after
        // every fetch task has finished and released its clone.
        tokio::spawn(async move {
            while let Some(joined) = tasks.join_next().await {
                if let Err(err) = joined {
                    tracing::warn!(error = %err, "fetch task terminated abnormally");
                }
            }
            drop(sender);
        });

        CompletionStream { receiver }
    }

    /// Fetch, filter and order the top `target_count` matches of `ranked`.
    /// Individual item failures shrink the result instead of failing it.
    pub async fn aggregate(
        &self,
        ranked: &RankedIdentifierList,
        predicate: Predicate,
    ) -> ResultSet {
        let stream = self.start(ranked, predicate);
        OrderAssembler::new(self.config.target_count).assemble(stream).await
    }
}

async fn resolve(
    cache: &SharedItemCache,
    items: &dyn ItemProvider,
    id: ItemId,
) -> Option<ItemRecord> {
    if let Some(record) = cache.lookup(id) {
        tracing::trace!(item_id = %id, "item cache hit");
        return Some(record);
    }

    tracing::debug!(item_id = %id, "fetching item");
    match items.fetch(id).await {
        Ok(record) => {
            cache.insert(id, record.clone());
            Some(record)
        }
        Err(err) => {
            tracing::warn!(item_id = %id, error = %err, "item fetch failed, skipping");
            None
        }
    }
}
