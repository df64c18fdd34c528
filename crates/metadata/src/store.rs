//! Metadata store trait and the SQLite implementation.

use crate::dialect::{Query, QueryTable};
use crate::error::{MetadataError, MetadataResult};
use crate::repos::{CaughtSetRepo, SpeciesCacheRepo, UserRepo};
use crate::repos::caught::impl_caught_set_repo;
use crate::schema::{schema_for, schema_statements};
use async_trait::async_trait;
use dextrack_core::{DatabaseConfig, Dialect};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, Transaction};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Path that selects a private in-memory SQLite database.
pub const MEMORY_PATH: &str = ":memory:";

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: UserRepo + CaughtSetRepo + SpeciesCacheRepo + Send + Sync {
    /// Dialect this store speaks.
    fn dialect(&self) -> Dialect;

    /// Create the schema if it does not exist.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;

    /// Close every pooled connection. Later calls fail with a database error.
    async fn close(&self);
}

/// Roll back a failed write, keeping the original error as the one reported.
pub(crate) async fn rollback<DB: sqlx::Database>(tx: Transaction<'_, DB>, query: Query) {
    if let Err(e) = tx.rollback().await {
        tracing::warn!(query = query.name(), error = %e, "Rollback failed");
    }
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
    queries: QueryTable,
}

impl SqliteStore {
    /// Open (creating if missing) the database file at `path` and run the schema.
    pub async fn new(path: impl AsRef<Path>, busy_timeout: Duration) -> MetadataResult<Self> {
        let path = path.as_ref();
        let in_memory = path == Path::new(MEMORY_PATH);

        let opts = if in_memory {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            // Ensure parent directory exists
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        };
        let opts = opts
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(busy_timeout);

        // A single connection serializes writers and keeps an in-memory database alive.
        let mut pool_opts = SqlitePoolOptions::new().max_connections(1);
        if in_memory {
            pool_opts = pool_opts
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>);
        }
        let pool = pool_opts.connect_with(opts).await?;

        let store = Self {
            pool,
            queries: QueryTable::new(Dialect::Sqlite),
        };
        store.migrate().await?;

        tracing::info!(path = %path.display(), "Opened SQLite metadata store");
        Ok(store)
    }

    /// Open the store described by a SQLite [`DatabaseConfig`].
    pub async fn from_config(config: &DatabaseConfig) -> MetadataResult<Self> {
        if config.dialect() != Dialect::Sqlite {
            return Err(MetadataError::Config(format!(
                "expected a sqlite path, got a {} url",
                config.dialect()
            )));
        }
        Self::new(
            &config.url,
            Duration::from_secs(config.sqlite_busy_timeout_secs),
        )
        .await
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Take the database write lock before the caught row is read.
    ///
    /// In-process callers already queue on the single pooled connection; this
    /// also keeps other processes from writing between the read and the write.
    async fn lock_caught_set(
        tx: &mut Transaction<'_, Sqlite>,
        _user_id: i32,
        _generation: i32,
    ) -> MetadataResult<()> {
        sqlx::query("UPDATE caught SET generation = generation WHERE 0")
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

impl_caught_set_repo!(SqliteStore, Sqlite);

#[async_trait]
impl MetadataStore for SqliteStore {
    fn dialect(&self) -> Dialect {
        self.queries.dialect()
    }

    async fn migrate(&self) -> MetadataResult<()> {
        let mut tx = self.pool.begin().await?;
        for statement in schema_statements(schema_for(self.dialect())) {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Closed SQLite metadata store");
    }
}

// User and species cache repositories for SqliteStore
mod sqlite_impl {
    use super::*;
    use crate::models::{SqliteCacheRow, UserRow};
    use dextrack_core::{CacheEntry, NewCacheEntry, User};

    #[async_trait]
    impl UserRepo for SqliteStore {
        async fn create_user(&self, username: &str, password: &str) -> MetadataResult<()> {
            let mut tx = self.pool.begin().await?;
            let result = sqlx::query(self.queries.get(Query::CreateUser))
                .bind(username)
                .bind(password)
                .execute(&mut *tx)
                .await;

            match result {
                Ok(_) => {
                    tx.commit().await?;
                    tracing::info!(username = username, "Registered user");
                    Ok(())
                }
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    rollback(tx, Query::CreateUser).await;
                    tracing::info!(username = username, "Username already registered");
                    Err(MetadataError::DuplicateUser {
                        username: username.to_string(),
                    })
                }
                Err(e) => {
                    rollback(tx, Query::CreateUser).await;
                    Err(e.into())
                }
            }
        }

        async fn authenticate_user(
            &self,
            username: &str,
            password: &str,
        ) -> MetadataResult<User> {
            let row = sqlx::query_as::<_, UserRow>(self.queries.get(Query::GetUser))
                .bind(username)
                .bind(password)
                .fetch_optional(&self.pool)
                .await?;
            row.map(User::from)
                .ok_or_else(|| MetadataError::InvalidCredentials {
                    username: username.to_string(),
                })
        }
    }

    #[async_trait]
    impl SpeciesCacheRepo for SqliteStore {
        async fn upsert_cache_entries(
            &self,
            gen_id: i32,
            entries: &[NewCacheEntry],
        ) -> MetadataResult<()> {
            if entries.is_empty() {
                return Ok(());
            }

            let mut tx = self.pool.begin().await?;
            for entry in entries {
                let result = sqlx::query(self.queries.get(Query::UpsertCache))
                    .bind(entry.id)
                    .bind(&entry.name)
                    .bind(&entry.img)
                    .bind(gen_id)
                    .execute(&mut *tx)
                    .await;
                if let Err(e) = result {
                    rollback(tx, Query::UpsertCache).await;
                    return Err(e.into());
                }
            }
            tx.commit().await?;

            tracing::debug!(gen_id = gen_id, count = entries.len(), "Upserted cache entries");
            Ok(())
        }

        async fn get_cached_entries(&self, gen_id: i32) -> MetadataResult<Vec<CacheEntry>> {
            let rows = sqlx::query_as::<_, SqliteCacheRow>(self.queries.get(Query::GetCached))
                .bind(gen_id)
                .fetch_all(&self.pool)
                .await?;
            Ok(rows.into_iter().map(CacheEntry::from).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dextrack_core::{CaughtSet, NewCacheEntry, UpdatedAt};

    async fn memory_store() -> SqliteStore {
        SqliteStore::new(MEMORY_PATH, Duration::from_secs(5))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_in_memory_store_is_migrated() {
        let store = memory_store().await;
        store.health_check().await.unwrap();
        assert_eq!(store.dialect(), Dialect::Sqlite);

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('pkm_user', 'caught', 'cache') ORDER BY name",
        )
        .fetch_all(store.pool())
        .await
        .unwrap();
        let names: Vec<_> = tables.into_iter().map(|(name,)| name).collect();
        assert_eq!(names, vec!["cache", "caught", "pkm_user"]);
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let store = memory_store().await;
        store.create_user("ash", "pikachu123").await.unwrap();
        store.migrate().await.unwrap();
        store.migrate().await.unwrap();
        let user = store.authenticate_user("ash", "pikachu123").await.unwrap();
        assert_eq!(user.username, "ash");
    }

    #[tokio::test]
    async fn test_foreign_keys_are_enforced() {
        let store = memory_store().await;
        let err = store
            .create_caught_set(&CaughtSet::empty(999, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, MetadataError::InvalidUser { user_id: 999 }));
    }

    #[tokio::test]
    async fn test_sqlite_timestamps_are_text() {
        let store = memory_store().await;
        store
            .upsert_cache_entries(1, &[NewCacheEntry::new(1, "bulbasaur", "b.png")])
            .await
            .unwrap();
        let entries = store.get_cached_entries(1).await.unwrap();
        assert_eq!(entries.len(), 1);
        let UpdatedAt::Text(text) = &entries[0].updated_at else {
            panic!("expected text timestamp, got {:?}", entries[0].updated_at);
        };
        assert_eq!(text.len(), "YYYY-MM-DD HH:MM:SS".len());
        entries[0].updated_at.to_timestamp().unwrap();
    }

    #[tokio::test]
    async fn test_from_config_rejects_postgres_url() {
        let config = DatabaseConfig::from_url("postgres://localhost/dex");
        assert!(matches!(
            SqliteStore::from_config(&config).await,
            Err(MetadataError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_closed_store_is_unusable() {
        let store = memory_store().await;
        store.close().await;
        assert!(matches!(
            store.health_check().await,
            Err(MetadataError::Database(sqlx::Error::PoolClosed))
        ));
    }
}
