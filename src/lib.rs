//! Async client for the Polyglot translation API.
//! Local expiring cache, coalescing of concurrent identical requests, and
//! batched translation with cache/network result merging. UI bindings live
//! in separate adapter crates and consume only the operations re-exported
//! here.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod transport;
pub mod types;

pub use cache::{CacheStore, MemoryStore, SqliteStore};
pub use client::{ClientStats, TranslationClient};
pub use config::{BatchOptions, ClientConfig, TranslateOptions};
pub use error::TransportError;
pub use transport::{HttpTransport, Transport};
pub use types::{
    BatchEntry, BatchItem, BatchOutcome, JobState, JobStatus, Language, Translation,
};
