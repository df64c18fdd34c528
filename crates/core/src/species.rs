//! Per-generation species cache entries and the read-time freshness filter.
//!
//! Cache rows are never purged. Entries older than the freshness threshold
//! are dropped when read instead.

use serde::{Deserialize, Serialize};
use std::fmt;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};

/// Age at which a cache entry is considered stale: 3 days.
pub const CACHE_EXPIRATION: Duration = Duration::days(3);

/// Last refresh time of a cache entry, in the form the backend returned it.
///
/// PostgreSQL yields a `TIMESTAMP WITH TIME ZONE`; SQLite stores
/// `CURRENT_TIMESTAMP` text (`YYYY-MM-DD HH:MM:SS`, UTC).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpdatedAt {
    #[serde(with = "time::serde::rfc3339")]
    Timestamp(OffsetDateTime),
    Text(String),
}

impl UpdatedAt {
    /// Normalize to a UTC timestamp.
    pub fn to_timestamp(&self) -> Result<OffsetDateTime, time::error::Parse> {
        match self {
            Self::Timestamp(ts) => Ok(*ts),
            Self::Text(text) => PrimitiveDateTime::parse(
                text,
                format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
            )
            .map(PrimitiveDateTime::assume_utc),
        }
    }
}

impl fmt::Display for UpdatedAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timestamp(ts) => write!(f, "{ts}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// A cached species record for one generation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub id: i32,
    pub gen_id: i32,
    pub name: String,
    pub img: String,
    pub updated_at: UpdatedAt,
}

/// Input shape for a cache refresh; `gen_id` and `updated_at` come from the
/// caller and the database respectively.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCacheEntry {
    pub id: i32,
    pub name: String,
    pub img: String,
}

impl NewCacheEntry {
    pub fn new(id: i32, name: impl Into<String>, img: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            img: img.into(),
        }
    }
}

/// Dashboard row: whether one species of a generation is caught.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesStatus {
    pub id: i32,
    pub caught: bool,
}

/// Drops cache entries whose age reaches the threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FreshnessFilter {
    threshold: Duration,
}

impl Default for FreshnessFilter {
    fn default() -> Self {
        Self::new(CACHE_EXPIRATION)
    }
}

impl FreshnessFilter {
    pub const fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// An entry is fresh while `now - updated_at < threshold`.
    ///
    /// Text timestamps that fail to parse count as stale.
    pub fn is_fresh(&self, entry: &CacheEntry, now: OffsetDateTime) -> bool {
        match entry.updated_at.to_timestamp() {
            Ok(updated_at) => now - updated_at < self.threshold,
            Err(e) => {
                tracing::warn!(
                    id = entry.id,
                    gen_id = entry.gen_id,
                    updated_at = %entry.updated_at,
                    error = %e,
                    "Unparsable cache timestamp, treating entry as stale"
                );
                false
            }
        }
    }

    /// Keep only the fresh entries, preserving order.
    pub fn retain_fresh(&self, entries: Vec<CacheEntry>, now: OffsetDateTime) -> Vec<CacheEntry> {
        let total = entries.len();
        let fresh: Vec<_> = entries
            .into_iter()
            .filter(|entry| self.is_fresh(entry, now))
            .collect();
        if fresh.len() < total {
            tracing::debug!(
                total,
                stale = total - fresh.len(),
                "Skipped stale cache entries"
            );
        }
        fresh
    }
}
