//! Metadata store abstraction and implementations for dextrack.
//!
//! This crate provides the persistence layer behind one contract for two
//! dialects (SQLite file or in-memory database, PostgreSQL server):
//! - Schema creation on startup
//! - Users, with unique usernames
//! - Per-generation caught sets stored as comma-joined ID columns
//! - The per-generation species cache, refreshed by upsert
//!
//! The dialect is chosen from the connection string alone; see [`connect`].

pub mod dialect;
pub mod error;
pub mod models;
pub mod postgres;
pub mod repos;
pub mod schema;
pub mod store;
pub mod tracker;

pub use dialect::{Query, QueryTable};
pub use error::{MetadataError, MetadataResult};
pub use postgres::PostgresStore;
pub use repos::{CaughtSetRepo, SpeciesCacheRepo, UserRepo};
pub use store::{MetadataStore, SqliteStore};
pub use tracker::Tracker;

use dextrack_core::{DatabaseConfig, Dialect};
use std::sync::Arc;

/// Create a metadata store from configuration.
pub async fn connect(config: &DatabaseConfig) -> MetadataResult<Arc<dyn MetadataStore>> {
    config.validate()?;
    match config.dialect() {
        Dialect::Sqlite => {
            let store = SqliteStore::from_config(config).await?;
            Ok(Arc::new(store) as Arc<dyn MetadataStore>)
        }
        Dialect::Postgres => {
            let store = PostgresStore::from_config(config).await?;
            Ok(Arc::new(store) as Arc<dyn MetadataStore>)
        }
    }
}

/// Create a metadata store from a bare connection string with default settings.
pub async fn connect_url(url: &str) -> MetadataResult<Arc<dyn MetadataStore>> {
    connect(&DatabaseConfig::from_url(url)).await
}
