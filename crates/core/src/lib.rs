//! Core domain types and shared logic for dextrack.
//!
//! This crate defines the data model used across the other crates:
//! - Users and the session identity guard
//! - Caught sets and their comma-joined column encoding
//! - Species cache entries and the read-time freshness filter
//! - Database configuration and dialect selection

pub mod caught;
pub mod config;
pub mod error;
pub mod species;
pub mod user;

pub use caught::{CaughtChange, CaughtSet};
pub use config::{AppConfig, DatabaseConfig, Dialect};
pub use error::{Error, Result};
pub use species::{
    CACHE_EXPIRATION, CacheEntry, FreshnessFilter, NewCacheEntry, SpeciesStatus,
    UpdatedAt,
};
pub use user::{SessionIdentity, User};
