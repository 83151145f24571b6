use async_trait::async_trait;

use crate::{ItemId, ItemRecord, ProviderError};

/// Source of the ordered ranking snapshot.
#[async_trait]
pub trait RankingProvider: Send + Sync {
    /// Identifiers in rank order, highest first.
    ///
    /// # Errors
    /// Returns [`ProviderError::Transport`] when the snapshot cannot be obtained.
    async fn top(&self) -> Result<Vec<ItemId>, ProviderError>;
}

/// Source of individual item records.
#[async_trait]
pub trait ItemProvider: Send + Sync {
    /// # Errors
    /// Returns [`ProviderError::NotFound`] for unknown items and
    /// [`ProviderError::Transport`] for any other failure.
    async fn fetch(&self, id: ItemId) -> Result<ItemRecord, ProviderError>;
}
