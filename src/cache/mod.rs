//! Local expiring cache: key construction and the store abstraction.
//! Keys are `polyglot:{source}:{target}:{blake3_hex(text)}`; the reserved
//! prefix keeps clearing away from unrelated data in a shared store.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::time::Duration;

/// Reserved prefix for every key this crate writes.
pub const KEY_PREFIX: &str = "polyglot:";

/// Fixed key holding the JSON-encoded language list.
pub const LANGUAGES_KEY: &str = "polyglot:languages";

/// An expiring key-value store. Implementations own expiry: `get` treats a
/// stale entry as absent and evicts it, `set` always overwrites with a TTL
/// measured from the moment of write.
///
/// Storage is best-effort. Implementations log failures and never surface
/// them; the coordinator proceeds via the network when the cache misbehaves.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str, ttl: Duration);
    /// Remove every entry whose key starts with `prefix`. Returns the number
    /// of entries removed.
    fn clear_prefix(&self, prefix: &str) -> usize;
}

/// Build the cache key for a (source, target, text) tuple. The text is
/// content-hashed with blake3; a collision costs a wrong cache hit, accepted
/// as rare.
pub fn translation_key(source: &str, target: &str, text: &str) -> String {
    let hash = blake3::hash(text.as_bytes()).to_hex();
    format!("{KEY_PREFIX}{source}:{target}:{hash}")
}

/// Prefix matching every cached translation from `source` into `target`.
pub fn pair_prefix(source: &str, target: &str) -> String {
    format!("{KEY_PREFIX}{source}:{target}:")
}
