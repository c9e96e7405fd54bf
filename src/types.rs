//! Public result and wire types for the translation API.
//! Wire shapes use camelCase field names to match the JSON endpoints.

use serde::{Deserialize, Serialize};

/// Outcome of a single translation.
///
/// `translated == false` with no error means the call was a no-op (identical
/// languages, empty text, or no resolvable target). `translated == false`
/// with an error means the request failed and `text` is the original input,
/// usable as a fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub text: String,
    pub translated: bool,
    #[serde(default)]
    pub from_cache: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl Translation {
    /// A no-op result: the input is returned unchanged.
    pub fn skipped(text: String) -> Self {
        Self {
            text,
            translated: false,
            from_cache: false,
            error: None,
        }
    }

    /// A freshly translated result from the network.
    pub fn fresh(text: String) -> Self {
        Self {
            text,
            translated: true,
            from_cache: false,
            error: None,
        }
    }

    /// A translation served from the local cache.
    pub fn cached(text: String) -> Self {
        Self {
            text,
            translated: true,
            from_cache: true,
            error: None,
        }
    }

    /// A failed translation; `text` carries the original input.
    pub fn failed(text: String, error: String) -> Self {
        Self {
            text,
            translated: false,
            from_cache: false,
            error: Some(error),
        }
    }
}

/// One item in a batch translation request.
/// Missing ids are generated; missing languages fall back to the configured
/// defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    #[serde(default)]
    pub id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub source_language: Option<String>,
    #[serde(default)]
    pub target_language: Option<String>,
}

impl BatchItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Per-item batch result, aligned to the original input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
    pub id: String,
    pub text: String,
    pub translated: bool,
    #[serde(default)]
    pub from_cache: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Result of a batch translation: inline results, or a job handle when the
/// server queued the work for asynchronous processing.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BatchOutcome {
    #[serde(rename_all = "camelCase")]
    Completed {
        results: Vec<BatchEntry>,
        error: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Queued { job_id: String, status: JobState },
}

/// Server-side state of an asynchronous batch job. `Error` is the
/// client-side conversion of a failed status request, never sent by the
/// server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Processing,
    Completed,
    Failed,
    Error,
}

/// Status of an asynchronous batch job as reported by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    #[serde(default)]
    pub job_id: Option<String>,
    pub status: JobState,
    #[serde(default)]
    pub progress: Option<f32>,
    #[serde(default)]
    pub results: Option<Vec<JobResultEntry>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A translated item inside a completed job's status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResultEntry {
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A language supported by the translation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub native_name: Option<String>,
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(default)]
    pub rtl: Option<bool>,
}
