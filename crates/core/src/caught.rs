//! Caught sets: the creature IDs a user has marked caught in one generation.
//!
//! The `caught.pokemon_ids` column stores the list comma-joined in insertion
//! order (`"1,4,25"`); an empty list is stored as the empty string.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Column separator for encoded caught IDs.
pub const SEPARATOR: &str = ",";

/// Encode an ordered list of IDs into the `pokemon_ids` column form.
pub fn encode(ids: &[i32]) -> String {
    ids.iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

/// Decode the `pokemon_ids` column back into an ordered list of IDs.
///
/// Parts are parsed as-is: whitespace or empty parts are rejected.
pub fn decode(column: &str) -> Result<Vec<i32>> {
    if column.is_empty() {
        return Ok(Vec::new());
    }
    column
        .split(SEPARATOR)
        .map(|part| {
            part.parse::<i32>().map_err(|e| {
                Error::InvalidCaughtSetEncoding(format!("{part:?} in {column:?}: {e}"))
            })
        })
        .collect()
}

/// A single edit to a caught set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaughtChange {
    Catch(i32),
    Release(i32),
}

impl CaughtChange {
    pub fn pokemon_id(self) -> i32 {
        match self {
            Self::Catch(id) | Self::Release(id) => id,
        }
    }
}

/// Caught IDs for a (user, generation) pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaughtSet {
    pub user_id: i32,
    pub pokemon_ids: Vec<i32>,
    pub generation: i32,
}

impl CaughtSet {
    /// An empty caught set, as created on first access.
    pub fn empty(user_id: i32, generation: i32) -> Self {
        Self {
            user_id,
            pokemon_ids: Vec::new(),
            generation,
        }
    }

    /// Build from a stored row, decoding the column. `NULL` reads as empty.
    pub fn from_column(user_id: i32, column: Option<&str>, generation: i32) -> Result<Self> {
        Ok(Self {
            user_id,
            pokemon_ids: decode(column.unwrap_or_default())?,
            generation,
        })
    }

    /// Encoded column value.
    pub fn to_column(&self) -> String {
        encode(&self.pokemon_ids)
    }

    pub fn contains(&self, pokemon_id: i32) -> bool {
        self.pokemon_ids.contains(&pokemon_id)
    }

    /// Mark an ID as caught. Catching an already-caught ID is an error.
    pub fn catch(&mut self, pokemon_id: i32) -> Result<()> {
        if self.contains(pokemon_id) {
            return Err(Error::InvalidCaughtSetState {
                generation: self.generation,
                pokemon_id,
                reason: "already caught",
            });
        }
        self.pokemon_ids.push(pokemon_id);
        Ok(())
    }

    /// Apply a [`CaughtChange`]. On error the set is left untouched.
    pub fn apply(&mut self, change: CaughtChange) -> Result<()> {
        match change {
            CaughtChange::Catch(id) => self.catch(id),
            CaughtChange::Release(id) => self.release(id),
        }
    }

    /// Release a caught ID. Releasing an ID that is not caught is an error.
    pub fn release(&mut self, pokemon_id: i32) -> Result<()> {
        let Some(position) = self.pokemon_ids.iter().position(|&id| id == pokemon_id) else {
            return Err(Error::InvalidCaughtSetState {
                generation: self.generation,
                pokemon_id,
                reason: "not caught",
            });
        };
        self.pokemon_ids.remove(position);
        Ok(())
    }
}
