//! Schema DDL for both dialects.
//!
//! Every statement is `CREATE ... IF NOT EXISTS`, so running the script on
//! each startup is safe.

use dextrack_core::Dialect;

/// SQLite schema (run as a single multi-statement script).
pub const SQLITE_SCHEMA: &str = r#"
-- Registered users
CREATE TABLE IF NOT EXISTS pkm_user (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username VARCHAR(255) UNIQUE NOT NULL,
    password VARCHAR(255) NOT NULL
);

-- Caught sets, one row per (user, generation)
CREATE TABLE IF NOT EXISTS caught (
    user_id INTEGER,
    pokemon_ids TEXT,
    generation INTEGER,
    FOREIGN KEY (user_id) REFERENCES pkm_user(id)
);

-- Species cache per generation
CREATE TABLE IF NOT EXISTS cache (
    id INTEGER NOT NULL,
    gen_id INTEGER NOT NULL,
    name VARCHAR(100) NOT NULL,
    img VARCHAR(500) NOT NULL,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (id, gen_id)
);
"#;

/// PostgreSQL schema (embedded).
pub const POSTGRES_SCHEMA: &str = include_str!("postgres_schema.sql");

/// DDL script for a dialect.
pub fn schema_for(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Sqlite => SQLITE_SCHEMA,
        Dialect::Postgres => POSTGRES_SCHEMA,
    }
}

/// Split a DDL script into statements, dropping empty and comment-only ones.
///
/// PostgreSQL doesn't allow multiple statements in a single prepared statement.
pub fn schema_statements(schema: &str) -> Vec<&str> {
    schema
        .split(';')
        .filter_map(|statement| {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                return None;
            }
            let has_sql = trimmed.lines().any(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("--")
            });
            has_sql.then_some(trimmed)
        })
        .collect()
}
