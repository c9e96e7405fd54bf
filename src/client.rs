//! Translation coordinator: cache consultation, request coalescing, batch
//! merging. Public operations never return `Err` and never panic; transport
//! failures fold into result values with the original text as fallback.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::cache::{self, CacheStore, MemoryStore};
use crate::config::{BatchOptions, ClientConfig, TranslateOptions};
use crate::error::TransportError;
use crate::transport::{
    BatchRequest, BatchRequestItem, BatchResponseItem, HttpTransport, TranslateRequest, Transport,
};
use crate::types::{
    BatchEntry, BatchItem, BatchOutcome, JobState, JobStatus, Language, Translation,
};

type SharedTranslation = Shared<BoxFuture<'static, Translation>>;

/// Client for the translation API. Owns the cache store and the in-flight
/// request registry; concurrent callers for the same (source, target, text)
/// tuple share one network call.
pub struct TranslationClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    store: Arc<dyn CacheStore>,
    pending: Arc<Mutex<HashMap<String, SharedTranslation>>>,
    counters: Counters,
}

#[derive(Default)]
struct Counters {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    network_calls: AtomicU64,
    coalesced: AtomicU64,
}

/// Snapshot of the client's operation counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ClientStats {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub network_calls: u64,
    /// Requests that joined an already in-flight network call.
    pub coalesced: u64,
}

impl TranslationClient {
    /// Build a client with the HTTP transport and an in-memory cache store.
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        Ok(Self::with_parts(
            config,
            transport,
            Arc::new(MemoryStore::default()),
        ))
    }

    /// Build a client from injected parts. Use this to supply a persistent
    /// store ([`crate::cache::SqliteStore`]) or a test transport.
    pub fn with_parts(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn CacheStore>,
    ) -> Self {
        if config.api_key.is_none() {
            warn!("no API key configured; requests will likely be rejected");
        }
        Self {
            config,
            transport,
            store,
            pending: Arc::new(Mutex::new(HashMap::new())),
            counters: Counters::default(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn stats(&self) -> ClientStats {
        ClientStats {
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.counters.cache_misses.load(Ordering::Relaxed),
            network_calls: self.counters.network_calls.load(Ordering::Relaxed),
            coalesced: self.counters.coalesced.load(Ordering::Relaxed),
        }
    }

    /// Translate a single text.
    ///
    /// No-op cases, in order: empty text; no resolvable target language;
    /// source equals target. Cache hits return `from_cache: true`. A failed
    /// request resolves to the original text with `error` set.
    pub async fn translate(&self, text: &str, opts: TranslateOptions) -> Translation {
        if text.is_empty() {
            return Translation::skipped(String::new());
        }

        let source = opts
            .source_language
            .unwrap_or_else(|| self.config.default_source_language.clone());
        let target = match opts
            .target_language
            .or_else(|| self.config.default_target_language.clone())
        {
            Some(target) => target,
            None => {
                if self.config.debug {
                    debug!("no target language resolvable, returning input unchanged");
                }
                return Translation::skipped(text.to_string());
            }
        };
        if source == target {
            return Translation::skipped(text.to_string());
        }

        let key = cache::translation_key(&source, &target, text);

        if self.config.use_cache && !opts.force {
            if let Some(hit) = self.store.get(&key) {
                self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
                if self.config.debug {
                    debug!(%source, %target, "translation cache hit");
                }
                return Translation::cached(hit);
            }
            self.counters.cache_misses.fetch_add(1, Ordering::Relaxed);
        }

        // Join an in-flight call for the same key, or start one. The shared
        // future removes its own registry entry on settlement, so cleanup
        // does not depend on any particular caller staying alive.
        let fut = {
            let mut pending = self.pending.lock();
            match pending.get(&key) {
                Some(existing) => {
                    self.counters.coalesced.fetch_add(1, Ordering::Relaxed);
                    if self.config.debug {
                        debug!(%source, %target, "joining in-flight translation");
                    }
                    existing.clone()
                }
                None => {
                    let fut = self.spawn_network_translate(
                        text.to_string(),
                        source,
                        target,
                        opts.preserve_formatting,
                        key.clone(),
                    );
                    pending.insert(key, fut.clone());
                    fut
                }
            }
        };

        fut.await
    }

    /// Build the shared future performing one network translation, writing
    /// the cache on success. The future unregisters itself from the pending
    /// map when it settles; whichever caller drives it to completion runs
    /// the cleanup.
    fn spawn_network_translate(
        &self,
        text: String,
        source: String,
        target: String,
        preserve_formatting: bool,
        key: String,
    ) -> SharedTranslation {
        self.counters.network_calls.fetch_add(1, Ordering::Relaxed);
        let transport = Arc::clone(&self.transport);
        let store = Arc::clone(&self.store);
        let pending = Arc::clone(&self.pending);
        let cache_write = self.config.use_cache;
        let ttl = self.config.cache_ttl;

        async move {
            let req = TranslateRequest {
                text: text.clone(),
                source_language: source,
                target_language: target,
                preserve_formatting,
            };
            let result = match transport.translate(&req).await {
                Ok(translated) => {
                    if cache_write {
                        store.set(&key, &translated, ttl);
                    }
                    Translation::fresh(translated)
                }
                Err(e) => {
                    warn!(error = %e, "translation request failed");
                    Translation::failed(text, e.to_string())
                }
            };
            pending.lock().remove(&key);
            result
        }
        .boxed()
        .shared()
    }

    /// Translate a batch of items with at most one network call.
    ///
    /// Cache hits and local no-ops (empty text, identity pair, no target)
    /// are answered without touching the network; only the remaining items
    /// travel. Results come back aligned to the input order. When the server
    /// queues the batch, a job handle is returned and nothing is cached —
    /// see [`Self::job_status`].
    pub async fn translate_batch(&self, items: Vec<BatchItem>, opts: BatchOptions) -> BatchOutcome {
        if items.is_empty() {
            return BatchOutcome::Completed {
                results: Vec::new(),
                error: None,
            };
        }

        let slots: Vec<Slot> = items
            .into_iter()
            .map(|item| self.resolve_slot(item, opts.force))
            .collect();

        let wire_items: Vec<BatchRequestItem> = slots
            .iter()
            .filter_map(|slot| match &slot.disposition {
                Disposition::Network { key: _ } => Some(BatchRequestItem {
                    id: slot.id.clone(),
                    text: slot.text.clone(),
                    source_language: slot.source.clone(),
                    // A network slot always carries a resolved target.
                    target_language: slot.target.clone().unwrap_or_default(),
                }),
                _ => None,
            })
            .collect();

        if wire_items.is_empty() {
            if self.config.debug {
                debug!(items = slots.len(), "batch fully answered locally");
            }
            return BatchOutcome::Completed {
                results: slots.iter().map(Slot::local_entry).collect(),
                error: None,
            };
        }

        self.counters.network_calls.fetch_add(1, Ordering::Relaxed);
        let sent = wire_items.len();
        let req = BatchRequest {
            items: wire_items,
            preserve_formatting: opts.preserve_formatting,
            run_async: opts.run_async,
        };

        match self.transport.translate_batch(&req).await {
            Ok(resp) => {
                if let Some(job_id) = resp.job_id {
                    // Queued server-side; results arrive via job_status
                    // polling and are not cached (no language pair there).
                    if self.config.debug {
                        debug!(%job_id, sent, "batch queued as async job");
                    }
                    return BatchOutcome::Queued {
                        job_id,
                        status: JobState::Processing,
                    };
                }

                let mut by_id: HashMap<String, BatchResponseItem> = resp
                    .results
                    .unwrap_or_default()
                    .into_iter()
                    .map(|r| (r.id.clone(), r))
                    .collect();

                let results = slots
                    .iter()
                    .map(|slot| match &slot.disposition {
                        Disposition::Network { key } => {
                            self.merge_network_entry(slot, key, by_id.remove(&slot.id))
                        }
                        _ => slot.local_entry(),
                    })
                    .collect();

                BatchOutcome::Completed {
                    results,
                    error: None,
                }
            }
            Err(e) => {
                warn!(error = %e, sent, "batch translation request failed");
                let message = e.to_string();
                let results = slots
                    .iter()
                    .map(|slot| match &slot.disposition {
                        Disposition::Network { .. } => BatchEntry {
                            id: slot.id.clone(),
                            text: slot.text.clone(),
                            translated: false,
                            from_cache: false,
                            error: Some(message.clone()),
                        },
                        _ => slot.local_entry(),
                    })
                    .collect();
                BatchOutcome::Completed {
                    results,
                    error: Some(message),
                }
            }
        }
    }

    /// Resolve one batch item: fill in id and languages, then decide whether
    /// it is a local no-op, a cache hit, or network-bound.
    fn resolve_slot(&self, item: BatchItem, force: bool) -> Slot {
        let id = item
            .id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let source = item
            .source_language
            .unwrap_or_else(|| self.config.default_source_language.clone());
        let target = item
            .target_language
            .or_else(|| self.config.default_target_language.clone());

        let disposition = match &target {
            Some(t) if !item.text.is_empty() && *t != source => {
                let key = cache::translation_key(&source, t, &item.text);
                if self.config.use_cache && !force {
                    if let Some(hit) = self.store.get(&key) {
                        self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
                        Disposition::Hit(hit)
                    } else {
                        self.counters.cache_misses.fetch_add(1, Ordering::Relaxed);
                        Disposition::Network { key }
                    }
                } else {
                    Disposition::Network { key }
                }
            }
            _ => Disposition::Local,
        };

        Slot {
            id,
            text: item.text,
            source,
            target,
            disposition,
        }
    }

    /// Build the entry for a network-bound item from the server's reply,
    /// caching fresh text under the item's own language pair.
    fn merge_network_entry(
        &self,
        slot: &Slot,
        key: &str,
        reply: Option<BatchResponseItem>,
    ) -> BatchEntry {
        match reply {
            Some(reply) => match reply.text {
                Some(text) => {
                    if self.config.use_cache {
                        self.store.set(key, &text, self.config.cache_ttl);
                    }
                    BatchEntry {
                        id: slot.id.clone(),
                        text,
                        translated: true,
                        from_cache: false,
                        error: None,
                    }
                }
                None => BatchEntry {
                    id: slot.id.clone(),
                    text: slot.text.clone(),
                    translated: false,
                    from_cache: false,
                    error: Some(reply.error.unwrap_or_else(|| "Translation failed".into())),
                },
            },
            None => BatchEntry {
                id: slot.id.clone(),
                text: slot.text.clone(),
                translated: false,
                from_cache: false,
                error: Some("Translation failed".into()),
            },
        }
    }

    /// Poll the status of an asynchronous batch job.
    ///
    /// Results from a completed job are not written to the cache: the status
    /// response carries no language pair to build a key from.
    pub async fn job_status(&self, job_id: &str) -> JobStatus {
        match self.transport.job_status(job_id).await {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, job_id, "job status request failed");
                JobStatus {
                    job_id: Some(job_id.to_string()),
                    status: JobState::Error,
                    progress: None,
                    results: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Fetch the supported language list, cached under a single fixed key.
    /// Any failure returns an empty list.
    pub async fn languages(&self) -> Vec<Language> {
        if self.config.use_cache {
            if let Some(raw) = self.store.get(cache::LANGUAGES_KEY) {
                match serde_json::from_str::<Vec<Language>>(&raw) {
                    Ok(list) => {
                        self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
                        return list;
                    }
                    Err(e) => {
                        debug!(error = %e, "cached language list unreadable, refetching");
                    }
                }
            }
            self.counters.cache_misses.fetch_add(1, Ordering::Relaxed);
        }

        self.counters.network_calls.fetch_add(1, Ordering::Relaxed);
        match self.transport.languages().await {
            Ok(list) => {
                if self.config.use_cache {
                    if let Ok(raw) = serde_json::to_string(&list) {
                        self.store.set(cache::LANGUAGES_KEY, &raw, self.config.cache_ttl);
                    }
                }
                list
            }
            Err(e) => {
                warn!(error = %e, "language list request failed");
                Vec::new()
            }
        }
    }

    /// Remove cached entries. With `None`, everything under the reserved
    /// prefix goes; keys the crate did not write are untouched.
    ///
    /// With `Some(target)`, only entries pairing the *configured default*
    /// source language with `target` are removed. Entries written with an
    /// explicit non-default source language do not match this filter.
    pub fn clear_cache(&self, target: Option<&str>) -> usize {
        let removed = match target {
            Some(target) => self.store.clear_prefix(&cache::pair_prefix(
                &self.config.default_source_language,
                target,
            )),
            None => self.store.clear_prefix(cache::KEY_PREFIX),
        };
        if self.config.debug {
            debug!(removed, target = target.unwrap_or("*"), "cache cleared");
        }
        removed
    }
}

/// One batch item after id/language resolution.
struct Slot {
    id: String,
    text: String,
    source: String,
    target: Option<String>,
    disposition: Disposition,
}

enum Disposition {
    /// Answered locally: empty text, identity pair, or no target.
    Local,
    /// Served from the cache with the stored translation.
    Hit(String),
    /// Goes into the network payload; `key` caches the eventual result.
    Network { key: String },
}

impl Slot {
    fn local_entry(&self) -> BatchEntry {
        match &self.disposition {
            Disposition::Hit(text) => BatchEntry {
                id: self.id.clone(),
                text: text.clone(),
                translated: true,
                from_cache: true,
                error: None,
            },
            _ => BatchEntry {
                id: self.id.clone(),
                text: self.text.clone(),
                translated: false,
                from_cache: false,
                error: None,
            },
        }
    }
}
