//! Caught-set tracking on top of a [`MetadataStore`].
//!
//! These are the compositions the web layer performs per request:
//! read-modify-write of caught sets and freshness-filtered cache reads.
//! The tracker keeps no per-user state and can be shared freely.

use crate::error::{MetadataError, MetadataResult};
use crate::repos::{CaughtSetRepo, SpeciesCacheRepo, UserRepo};
use crate::store::MetadataStore;
use dextrack_core::{
    CacheEntry, CaughtChange, CaughtSet, FreshnessFilter, NewCacheEntry, SpeciesStatus, User,
};
use std::sync::Arc;
use time::OffsetDateTime;

/// Service composing repository calls for the request layer.
#[derive(Clone)]
pub struct Tracker {
    store: Arc<dyn MetadataStore>,
    freshness: FreshnessFilter,
}

impl Tracker {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self::with_freshness(store, FreshnessFilter::default())
    }

    pub fn with_freshness(store: Arc<dyn MetadataStore>, freshness: FreshnessFilter) -> Self {
        Self { store, freshness }
    }

    /// Register a new user.
    pub async fn register(&self, username: &str, password: &str) -> MetadataResult<()> {
        self.store.create_user(username, password).await
    }

    /// Log in with clear-text credentials. Blank input never reaches the store.
    pub async fn login(&self, username: &str, password: &str) -> MetadataResult<User> {
        if username.is_empty() || password.is_empty() {
            return Err(MetadataError::InvalidCredentials {
                username: username.to_string(),
            });
        }
        self.store.authenticate_user(username, password).await
    }

    /// Caught set for a generation, created empty on first access.
    pub async fn caught_set(&self, user: &User, generation: i32) -> MetadataResult<CaughtSet> {
        self.store.get_caught_set(user, generation).await
    }

    /// Mark a species as caught and persist the new set.
    pub async fn catch(
        &self,
        user: &User,
        generation: i32,
        pokemon_id: i32,
    ) -> MetadataResult<CaughtSet> {
        self.store
            .modify_caught_set(user, generation, CaughtChange::Catch(pokemon_id))
            .await
    }

    /// Release a caught species and persist the new set.
    pub async fn release(
        &self,
        user: &User,
        generation: i32,
        pokemon_id: i32,
    ) -> MetadataResult<CaughtSet> {
        self.store
            .modify_caught_set(user, generation, CaughtChange::Release(pokemon_id))
            .await
    }

    /// Pair each species of a generation with its caught flag, in species order.
    pub async fn dashboard(
        &self,
        user: &User,
        generation: i32,
        species_ids: &[i32],
    ) -> MetadataResult<Vec<SpeciesStatus>> {
        let caught = self.caught_set(user, generation).await?;
        Ok(species_ids
            .iter()
            .map(|&id| SpeciesStatus {
                id,
                caught: caught.contains(id),
            })
            .collect())
    }

    /// Store fresh species data for a generation.
    pub async fn refresh_cache(
        &self,
        gen_id: i32,
        entries: &[NewCacheEntry],
    ) -> MetadataResult<()> {
        self.store.upsert_cache_entries(gen_id, entries).await
    }

    /// Cached species of a generation that are still fresh now.
    pub async fn fresh_cache(&self, gen_id: i32) -> MetadataResult<Vec<CacheEntry>> {
        self.fresh_cache_at(gen_id, OffsetDateTime::now_utc()).await
    }

    /// Cached species of a generation that are fresh at `now`.
    pub async fn fresh_cache_at(
        &self,
        gen_id: i32,
        now: OffsetDateTime,
    ) -> MetadataResult<Vec<CacheEntry>> {
        let entries = self.store.get_cached_entries(gen_id).await?;
        Ok(self.freshness.retain_fresh(entries, now))
    }
}
