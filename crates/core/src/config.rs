//! Configuration types shared across crates.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// URL schemes that route to the PostgreSQL backend.
pub const POSTGRES_SCHEMES: [&str; 2] = ["postgres://", "postgresql://"];

/// Storage dialect, selected once from the connection string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Embedded file-based engine.
    Sqlite,
    /// Client-server engine.
    Postgres,
}

impl Dialect {
    /// Pick the dialect for a connection string.
    ///
    /// Anything without a postgres scheme is treated as a SQLite file path.
    pub fn from_url(url: &str) -> Self {
        if POSTGRES_SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
            Self::Postgres
        } else {
            Self::Sqlite
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string: a `postgres://` URL or a SQLite file path.
    /// WARNING: Prefer the DATABASE_URL env var over storing credentials in config.
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Maximum connections in the PostgreSQL pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// PostgreSQL statement timeout in milliseconds.
    #[serde(default)]
    pub statement_timeout_ms: Option<u64>,
    /// How long a SQLite connection waits on a locked database.
    #[serde(default = "default_sqlite_busy_timeout_secs")]
    pub sqlite_busy_timeout_secs: u64,
}

fn default_database_url() -> String {
    "test.db".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_sqlite_busy_timeout_secs() -> u64 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            statement_timeout_ms: None,
            sqlite_busy_timeout_secs: default_sqlite_busy_timeout_secs(),
        }
    }
}

impl DatabaseConfig {
    /// Configuration for a connection string with all other settings defaulted.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn dialect(&self) -> Dialect {
        Dialect::from_url(&self.url)
    }

    /// Validate configuration invariants.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "database url must not be empty".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(Error::InvalidConfig(
                "max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top-level application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Figment;
    use figment::providers::{Format, Serialized, Toml};

    #[test]
    fn test_dialect_from_url() {
        assert_eq!(Dialect::from_url("postgres://u:p@db/dex"), Dialect::Postgres);
        assert_eq!(Dialect::from_url("postgresql://db/dex"), Dialect::Postgres);
        assert_eq!(Dialect::from_url("test.db"), Dialect::Sqlite);
        assert_eq!(Dialect::from_url("/var/lib/dex/data.db"), Dialect::Sqlite);
        assert_eq!(Dialect::from_url(":memory:"), Dialect::Sqlite);
        // Scheme must be a prefix, not a substring.
        assert_eq!(Dialect::from_url("data/postgres://x"), Dialect::Sqlite);
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.database.url, "test.db");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.database.dialect(), Dialect::Sqlite);
        config.database.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_empty_url() {
        let config = DatabaseConfig::from_url("  ");
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_zero_pool() {
        let config = DatabaseConfig {
            max_connections: 0,
            ..DatabaseConfig::from_url("postgres://db/dex")
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::string(
                r#"
                [database]
                url = "postgres://dex@localhost/dex"
                statement_timeout_ms = 30000
                "#,
            ))
            .extract()
            .unwrap();
        assert_eq!(config.database.dialect(), Dialect::Postgres);
        assert_eq!(config.database.statement_timeout_ms, Some(30000));
        assert_eq!(config.database.max_connections, 10);
    }
}
