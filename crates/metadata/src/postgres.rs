//! PostgreSQL-based metadata store implementation.

use crate::dialect::{Query, QueryTable};
use crate::error::{MetadataError, MetadataResult};
use crate::models::{PgCacheRow, UserRow};
use crate::repos::caught::impl_caught_set_repo;
use crate::repos::{SpeciesCacheRepo, UserRepo};
use crate::schema::{schema_for, schema_statements};
use crate::store::{MetadataStore, rollback};
use async_trait::async_trait;
use dextrack_core::{CacheEntry, DatabaseConfig, Dialect, NewCacheEntry, User};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres, Transaction};
use std::str::FromStr;

/// PostgreSQL-based metadata store.
pub struct PostgresStore {
    pool: Pool<Postgres>,
    queries: QueryTable,
}

impl PostgresStore {
    /// Create a new PostgreSQL store from a connection URL.
    pub async fn from_url(
        url: &str,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        let opts = PgConnectOptions::from_str(url)?;
        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    /// Open the store described by a PostgreSQL [`DatabaseConfig`].
    pub async fn from_config(config: &DatabaseConfig) -> MetadataResult<Self> {
        if config.dialect() != Dialect::Postgres {
            return Err(MetadataError::Config(
                "expected a postgres:// or postgresql:// url".to_string(),
            ));
        }
        Self::from_url(
            &config.url,
            config.max_connections,
            config.statement_timeout_ms,
        )
        .await
    }

    /// Internal: Connect to PostgreSQL with the given options.
    async fn connect(
        mut opts: PgConnectOptions,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        if let Some(timeout_ms) = statement_timeout_ms {
            opts = opts.options([("statement_timeout", format!("{}ms", timeout_ms))]);
            tracing::info!("PostgreSQL statement_timeout set to {}ms", timeout_ms);
        }

        // Log connection info without password
        tracing::info!(
            host = opts.get_host(),
            port = opts.get_port(),
            database = opts.get_database().unwrap_or("<default>"),
            max_connections = max_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        let store = Self {
            pool,
            queries: QueryTable::new(Dialect::Postgres),
        };
        store.migrate().await?;

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }

    /// Serialize transactions on one (user, generation) caught row.
    ///
    /// The `caught` table has no unique key, so row locks cannot guard the
    /// insert of a missing row; a transaction-scoped advisory lock can.
    async fn lock_caught_set(
        tx: &mut Transaction<'_, Postgres>,
        user_id: i32,
        generation: i32,
    ) -> MetadataResult<()> {
        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(user_id)
            .bind(generation)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

impl_caught_set_repo!(PostgresStore, Postgres);

#[async_trait]
impl MetadataStore for PostgresStore {
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
        tracing::info!("Closed PostgreSQL metadata store");
    }
}

#[async_trait]
impl UserRepo for PostgresStore {
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

    async fn authenticate_user(&self, username: &str, password: &str) -> MetadataResult<User> {
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
impl SpeciesCacheRepo for PostgresStore {
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
        let rows = sqlx::query_as::<_, PgCacheRow>(self.queries.get(Query::GetCached))
            .bind(gen_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(CacheEntry::from).collect())
    }
}
