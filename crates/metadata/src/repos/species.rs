//! Species cache repository.

use crate::error::MetadataResult;
use async_trait::async_trait;
use dextrack_core::{CacheEntry, NewCacheEntry};

/// Repository for the per-generation species cache.
#[async_trait]
pub trait SpeciesCacheRepo: Send + Sync {
    /// Insert or refresh entries keyed by (id, gen_id) in one transaction.
    ///
    /// Existing rows get `name`, `img` and `updated_at` overwritten.
    async fn upsert_cache_entries(
        &self,
        gen_id: i32,
        entries: &[NewCacheEntry],
    ) -> MetadataResult<()>;

    /// All cached entries of a generation, ordered by id, regardless of age.
    async fn get_cached_entries(&self, gen_id: i32) -> MetadataResult<Vec<CacheEntry>>;
}
