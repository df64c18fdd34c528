//! Database rows mapping to the dextrack schema.

use dextrack_core::{CacheEntry, CaughtSet, UpdatedAt, User};
use sqlx::FromRow;
use time::OffsetDateTime;

/// `pkm_user` row, without the password column.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i32,
    pub username: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User::new(row.id, row.username)
    }
}

/// `caught` row. Every column is nullable in the schema.
#[derive(Debug, Clone, FromRow)]
pub struct CaughtRow {
    pub user_id: Option<i32>,
    pub pokemon_ids: Option<String>,
    pub generation: Option<i32>,
}

impl CaughtRow {
    /// Decode into a [`CaughtSet`], filling NULL keys from the lookup.
    pub fn into_caught_set(
        self,
        user_id: i32,
        generation: i32,
    ) -> dextrack_core::Result<CaughtSet> {
        CaughtSet::from_column(
            self.user_id.unwrap_or(user_id),
            self.pokemon_ids.as_deref(),
            self.generation.unwrap_or(generation),
        )
    }
}

/// SQLite `cache` row: `updated_at` is `CURRENT_TIMESTAMP` text.
#[derive(Debug, Clone, FromRow)]
pub struct SqliteCacheRow {
    pub id: i32,
    pub gen_id: i32,
    pub name: String,
    pub img: String,
    pub updated_at: String,
}

impl From<SqliteCacheRow> for CacheEntry {
    fn from(row: SqliteCacheRow) -> Self {
        CacheEntry {
            id: row.id,
            gen_id: row.gen_id,
            name: row.name,
            img: row.img,
            updated_at: UpdatedAt::Text(row.updated_at),
        }
    }
}

/// PostgreSQL `cache` row: `updated_at` is `TIMESTAMP WITH TIME ZONE`.
#[derive(Debug, Clone, FromRow)]
pub struct PgCacheRow {
    pub id: i32,
    pub gen_id: i32,
    pub name: String,
    pub img: String,
    pub updated_at: OffsetDateTime,
}

impl From<PgCacheRow> for CacheEntry {
    fn from(row: PgCacheRow) -> Self {
        CacheEntry {
            id: row.id,
            gen_id: row.gen_id,
            name: row.name,
            img: row.img,
            updated_at: UpdatedAt::Timestamp(row.updated_at),
        }
    }
}
