//! Client configuration and per-call options.
//! Precedence for languages is explicit: per-call option, then configured
//! default, then the built-in default.

use std::time::Duration;

/// Placeholder endpoint used when no `api_url` is configured.
pub const DEFAULT_API_URL: &str = "https://api.polyglot.example.com";

/// Default source language.
pub const DEFAULT_SOURCE_LANGUAGE: &str = "en";

/// Default cache TTL: 24 hours.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(86_400);

/// Constructor-level configuration for [`crate::TranslationClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the translation API.
    pub api_url: String,
    /// API key sent as the `x-api-key` header. A missing key logs a warning
    /// at construction; requests are still attempted and fail naturally.
    pub api_key: Option<String>,
    /// Source language assumed when a call does not name one.
    pub default_source_language: String,
    /// Target language assumed when a call does not name one. With neither
    /// this nor a per-call target, translation is a no-op.
    pub default_target_language: Option<String>,
    /// Whether the local cache is consulted and written.
    pub use_cache: bool,
    /// Lifetime of cache entries, measured from the moment of write.
    pub cache_ttl: Duration,
    /// Gates per-operation diagnostic logging.
    pub debug: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            default_source_language: DEFAULT_SOURCE_LANGUAGE.to_string(),
            default_target_language: None,
            use_cache: true,
            cache_ttl: DEFAULT_CACHE_TTL,
            debug: false,
        }
    }
}

/// Per-call options for [`crate::TranslationClient::translate`].
#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    pub source_language: Option<String>,
    pub target_language: Option<String>,
    pub preserve_formatting: bool,
    /// Bypass the cache lookup. Successful results are still written back.
    pub force: bool,
}

impl TranslateOptions {
    /// Convenience: translate into `target` with everything else defaulted.
    pub fn into_language(target: impl Into<String>) -> Self {
        Self {
            target_language: Some(target.into()),
            ..Default::default()
        }
    }
}

/// Per-call options for [`crate::TranslationClient::translate_batch`].
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub preserve_formatting: bool,
    /// Ask the server to queue the batch and return a job handle.
    pub run_async: bool,
    /// Bypass cache lookups for every item.
    pub force: bool,
}
