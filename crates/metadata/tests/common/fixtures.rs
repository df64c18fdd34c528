//! Test data builders.

use dextrack_core::NewCacheEntry;

/// A handful of first-generation species.
#[allow(dead_code)]
pub fn kanto_starters() -> Vec<NewCacheEntry> {
    vec![
        NewCacheEntry::new(1, "bulbasaur", sprite_url(1)),
        NewCacheEntry::new(4, "charmander", sprite_url(4)),
        NewCacheEntry::new(7, "squirtle", sprite_url(7)),
    ]
}

/// Sprite URL in the shape the catalog API returns.
#[allow(dead_code)]
pub fn sprite_url(id: i32) -> String {
    format!("https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/{id}.png")
}

/// Username unique within one test run, so tests can share a backend.
#[allow(dead_code)]
pub fn unique_username(prefix: &str) -> String {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    format!(
        "{prefix}-{}-{}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    )
}
