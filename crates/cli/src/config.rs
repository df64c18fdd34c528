//! Configuration loading: defaults, optional TOML file, environment, flags.

use anyhow::{Context, Result};
use dextrack_core::AppConfig;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use std::path::Path;

/// Build the layered configuration source.
///
/// Later layers win: defaults, TOML file, `DEXTRACK_*` variables (`__`
/// separates nested keys), `DATABASE_URL`, then the `--database-url` flag.
pub fn figment(config_path: Option<&Path>, database_url: Option<&str>) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }
    figment = figment
        .merge(Env::prefixed("DEXTRACK_").split("__"))
        .merge(
            Env::raw()
                .only(&["DATABASE_URL"])
                .map(|_| "database.url".into()),
        );
    if let Some(url) = database_url {
        figment = figment.merge(Serialized::default("database.url", url));
    }
    figment
}

/// Load and validate the application configuration.
pub fn load(config_path: Option<&Path>, database_url: Option<&str>) -> Result<AppConfig> {
    if let Some(path) = config_path
        && !path.exists()
    {
        tracing::warn!(path = %path.display(), "Config file not found, using environment only");
    }
    let config: AppConfig = figment(config_path, database_url)
        .extract()
        .context("Failed to load configuration")?;
    config
        .database
        .validate()
        .context("Invalid database configuration")?;
    Ok(config)
}
