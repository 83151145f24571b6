use std::sync::Arc;
use std::time::{Duration, Instant};

use quiet_hn_core::{
    story_link_predicate, AggregateError, AggregationConfig, ConfigError, FetchCoordinator,
    ItemProvider, ItemRecord, Predicate, RankedIdentifierList, RankingProvider, SharedItemCache,
};
use serde::Serialize;

pub const API_CONTRACT_VERSION: &str = "api.v1";

/// One rendered entry: the record plus its display host.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Story {
    #[serde(flatten)]
    pub record: ItemRecord,
    pub host: Option<String>,
}

impl From<ItemRecord> for Story {
    fn from(record: ItemRecord) -> Self {
        let host = record.host();
        Self { record, host }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TopStoriesPage {
    pub stories: Vec<Story>,
    /// Size of the ranking snapshot the page was built from.
    pub ranked_count: usize,
    pub target_count: usize,
    pub latency_ms: u64,
    #[serde(skip)]
    pub latency: Duration,
}

/// Per-request glue: ranking snapshot in, ordered page out. Every clone shares
/// the same item cache, so it lives as long as the process.
#[derive(Clone)]
pub struct QuietHnApi {
    ranking: Arc<dyn RankingProvider>,
    coordinator: FetchCoordinator,
    predicate: Predicate,
}

impl std::fmt::Debug for QuietHnApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuietHnApi").field("coordinator", &self.coordinator).finish_non_exhaustive()
    }
}

impl QuietHnApi {
    /// # Errors
    /// Returns [`ConfigError`] when `config` is invalid.
    pub fn new(
        ranking: Arc<dyn RankingProvider>,
        items: Arc<dyn ItemProvider>,
        cache: SharedItemCache,
        config: AggregationConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            ranking,
            coordinator: FetchCoordinator::new(cache, items, config),
            predicate: story_link_predicate(),
        })
    }

    /// Replace the default "linkable story" membership test.
    #[must_use]
    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = predicate;
        self
    }

    #[must_use]
    pub fn config(&self) -> &AggregationConfig {
        self.coordinator.config()
    }

    #[must_use]
    pub fn cache(&self) -> &SharedItemCache {
        self.coordinator.cache()
    }

    /// Build the page of top stories.
    ///
    /// # Errors
    /// Returns [`AggregateError::Ranking`] when the ranking snapshot cannot be
    /// obtained. Failures of individual items only shorten the page.
    pub async fn top_stories(&self) -> Result<TopStoriesPage, AggregateError> {
        let started = Instant::now();
        let ranked = RankedIdentifierList::new(
            self.ranking.top().await.map_err(AggregateError::Ranking)?,
        );
        tracing::debug!(ranked = ranked.len(), "got ranking snapshot");

        let result = self.coordinator.aggregate(&ranked, Arc::clone(&self.predicate)).await;
        let latency = started.elapsed();
        let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            ranked = ranked.len(),
            stories = result.len(),
            target_count = self.config().target_count,
            latency_ms,
            "aggregated top stories"
        );

        Ok(TopStoriesPage {
            stories: result.into_records().into_iter().map(Story::from).collect(),
            ranked_count: ranked.len(),
            target_count: self.config().target_count,
            latency_ms,
            latency,
        })
    }
}
