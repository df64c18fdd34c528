//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid caught set state for generation {generation}: pokemon {pokemon_id} {reason}")]
    InvalidCaughtSetState {
        generation: i32,
        pokemon_id: i32,
        reason: &'static str,
    },

    #[error("invalid caught set encoding: {0}")]
    InvalidCaughtSetEncoding(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
