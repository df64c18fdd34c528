//! Operator CLI for dextrack.
//!
//! Runs the caught-set operations directly against the configured database,
//! which is either a SQLite file path or a `postgres://` URL.

mod config;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dextrack_core::{NewCacheEntry, User};
use dextrack_metadata::{SpeciesCacheRepo, Tracker};
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "dextrack")]
#[command(about = "Track caught species per generation")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, env = "DEXTRACK_CONFIG")]
    config: Option<PathBuf>,

    /// Database connection string (overrides config and DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct Credentials {
    /// Username
    username: String,

    /// Password
    #[arg(long, env = "DEXTRACK_PASSWORD")]
    password: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the schema (if missing) and check connectivity
    Init,
    /// Register a new user
    Register {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Check credentials and print the user
    Login {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Show the caught set of a generation
    Show {
        #[command(flatten)]
        credentials: Credentials,
        /// Generation number
        #[arg(long, short)]
        generation: i32,
    },
    /// Mark a species as caught
    Catch {
        #[command(flatten)]
        credentials: Credentials,
        /// Generation number
        #[arg(long, short)]
        generation: i32,
        /// Species id
        pokemon_id: i32,
    },
    /// Release a caught species
    Release {
        #[command(flatten)]
        credentials: Credentials,
        /// Generation number
        #[arg(long, short)]
        generation: i32,
        /// Species id
        pokemon_id: i32,
    },
    /// Species cache commands
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// List cached species of a generation
    List {
        /// Generation number
        gen_id: i32,
        /// Include stale entries
        #[arg(long, default_value_t = false)]
        all: bool,
    },
    /// Upsert species from a JSON array of {id, name, img}
    Put {
        /// Generation number
        gen_id: i32,
        /// JSON file to read (stdin when omitted)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn read_entries(file: Option<&PathBuf>) -> Result<Vec<NewCacheEntry>> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("Expected a JSON array of {id, name, img}")
}

async fn login(tracker: &Tracker, credentials: &Credentials) -> Result<User> {
    tracker
        .login(&credentials.username, &credentials.password)
        .await
        .context("Login failed")
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::load(cli.config.as_deref(), cli.database_url.as_deref())?;
    let store = dextrack_metadata::connect(&config.database)
        .await
        .with_context(|| format!("Failed to open {} database", config.database.dialect()))?;
    let tracker = Tracker::new(store.clone());

    let result = match cli.command {
        Commands::Init => {
            store.health_check().await.context("Health check failed")?;
            println!("{} schema ready", store.dialect());
            Ok(())
        }
        Commands::Register { credentials } => {
            tracker
                .register(&credentials.username, &credentials.password)
                .await
                .context("Failed to register user")?;
            println!("user created successfully, please, login");
            Ok(())
        }
        Commands::Login { credentials } => {
            let user = login(&tracker, &credentials).await?;
            print_json(&user)
        }
        Commands::Show {
            credentials,
            generation,
        } => {
            let user = login(&tracker, &credentials).await?;
            let caught = tracker.caught_set(&user, generation).await?;
            print_json(&caught)
        }
        Commands::Catch {
            credentials,
            generation,
            pokemon_id,
        } => {
            let user = login(&tracker, &credentials).await?;
            let caught = tracker
                .catch(&user, generation, pokemon_id)
                .await
                .context("Failed to catch")?;
            print_json(&caught)
        }
        Commands::Release {
            credentials,
            generation,
            pokemon_id,
        } => {
            let user = login(&tracker, &credentials).await?;
            let caught = tracker
                .release(&user, generation, pokemon_id)
                .await
                .context("Failed to release")?;
            print_json(&caught)
        }
        Commands::Cache { command } => match command {
            CacheCommands::List { gen_id, all } => {
                let entries = if all {
                    store.get_cached_entries(gen_id).await?
                } else {
                    tracker.fresh_cache(gen_id).await?
                };
                print_json(&entries)
            }
            CacheCommands::Put { gen_id, file } => {
                let entries = read_entries(file.as_ref())?;
                tracker
                    .refresh_cache(gen_id, &entries)
                    .await
                    .context("Failed to update cache")?;
                println!("cached {} species for generation {gen_id}", entries.len());
                Ok(())
            }
        },
    };

    store.close().await;
    result
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,dextrack_metadata=info,dextrack_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run(Cli::parse()).await
}
