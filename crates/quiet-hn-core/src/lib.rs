use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

mod assembler;
mod cache;
mod coordinator;
#[cfg(any(test, feature = "fixture"))]
pub mod fixture;
mod provider;

pub use assembler::{OrderAssembler, ResultSet};
pub use cache::SharedItemCache;
pub use coordinator::{CompletionStream, FetchCoordinator, RankedItem};
pub use provider::{ItemProvider, RankingProvider};

pub const DEFAULT_TARGET_COUNT: usize = 30;
pub const DEFAULT_OVERFETCH_FACTOR: f64 = 1.25;

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("item {0} not found")]
    NotFound(ItemId),
}

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("overfetch factor MUST be finite and >= 1.0, got {0}")]
    OverfetchFactor(f64),
}

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum AggregateError {
    #[error("ranking snapshot unavailable: {0}")]
    Ranking(#[source] ProviderError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash,
)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ItemId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Ordered identifier snapshot for one request. Position 0 is the highest rank.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct RankedIdentifierList {
    ids: Vec<ItemId>,
}

impl RankedIdentifierList {
    #[must_use]
    pub fn new(ids: Vec<ItemId>) -> Self {
        Self { ids }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[ItemId] {
        &self.ids
    }

    /// The first `size` identifiers by rank, or the whole list when it is shorter.
    #[must_use]
    pub fn working_set(&self, size: usize) -> &[ItemId] {
        &self.ids[..size.min(self.ids.len())]
    }
}

impl From<Vec<ItemId>> for RankedIdentifierList {
    fn from(ids: Vec<ItemId>) -> Self {
        Self::new(ids)
    }
}

impl FromIterator<u64> for RankedIdentifierList {
    fn from_iter<T: IntoIterator<Item = u64>>(iter: T) -> Self {
        Self::new(iter.into_iter().map(ItemId).collect())
    }
}

/// Fetched detail payload for one item. Only `item_type` and `url` are
/// interpreted here; everything else passes through to rendering.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct ItemRecord {
    pub id: ItemId,
    #[serde(rename = "type", default)]
    pub item_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub descendants: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kids: Vec<ItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ItemRecord {
    #[must_use]
    pub fn has_url(&self) -> bool {
        self.url.as_deref().is_some_and(|url| !url.trim().is_empty())
    }

    /// Display host of the linked URL, without a leading `www.`.
    #[must_use]
    pub fn host(&self) -> Option<String> {
        let parsed = url::Url::parse(self.url.as_deref()?).ok()?;
        let host = parsed.host_str()?;
        Some(host.strip_prefix("www.").unwrap_or(host).to_string())
    }
}

/// Membership test an item must pass to be included in a result.
pub type Predicate = Arc<dyn Fn(&ItemRecord) -> bool + Send + Sync>;

/// A linkable story: `type == "story"` with a non-empty URL.
#[must_use]
pub fn is_story_link(record: &ItemRecord) -> bool {
    record.item_type == "story" && record.has_url()
}

#[must_use]
pub fn story_link_predicate() -> Predicate {
    Arc::new(is_story_link)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AggregationConfig {
    pub target_count: usize,
    pub overfetch_factor: f64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self { target_count: DEFAULT_TARGET_COUNT, overfetch_factor: DEFAULT_OVERFETCH_FACTOR }
    }
}

impl AggregationConfig {
    /// Build a validated configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError::OverfetchFactor`] when the factor is not finite or below 1.0.
    pub fn new(target_count: usize, overfetch_factor: f64) -> Result<Self, ConfigError> {
        let config = Self { target_count, overfetch_factor };
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns [`ConfigError::OverfetchFactor`] when the factor is not finite or below 1.0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.overfetch_factor.is_finite() || self.overfetch_factor < 1.0 {
            return Err(ConfigError::OverfetchFactor(self.overfetch_factor));
        }
        Ok(())
    }

    /// `ceil(target_count * overfetch_factor)`, capped at `ranked_len`.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn working_set_size(&self, ranked_len: usize) -> usize {
        let raw = self.target_count as f64 * self.overfetch_factor;
        // Binary representation error only, e.g. 10 * 1.1 = 11.000000000000002.
        let wanted = if raw - raw.floor() <= raw * 4.0 * f64::EPSILON {
            raw.floor()
        } else {
            raw.ceil()
        };
        if wanted >= ranked_len as f64 {
            ranked_len
        } else {
            wanted as usize
        }
    }
}
