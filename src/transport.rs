//! HTTP transport for the translation API.
//! Connection pooling via reqwest; retry on 429 (Retry-After or 1s/2s/4s,
//! max 3), 5xx (exponential backoff, max 2), and timeout (once). Non-2xx is
//! failure regardless of body.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::types::{JobStatus, Language};

/// Body of `POST /api/translate`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub text: String,
    pub source_language: String,
    pub target_language: String,
    pub preserve_formatting: bool,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Body of `POST /api/translate/batch`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    pub items: Vec<BatchRequestItem>,
    pub preserve_formatting: bool,
    #[serde(rename = "async")]
    pub run_async: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequestItem {
    pub id: String,
    pub text: String,
    pub source_language: String,
    pub target_language: String,
}

/// Server reply to a batch request: inline results, or a job handle when the
/// batch was queued.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    #[serde(default)]
    pub results: Option<Vec<BatchResponseItem>>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponseItem {
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LanguagesResponse {
    languages: Vec<Language>,
}

/// The four endpoints the coordinator consumes. Implemented by
/// [`HttpTransport`] for production and by test doubles in the test suite.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn translate(&self, req: &TranslateRequest) -> Result<String, TransportError>;
    async fn translate_batch(&self, req: &BatchRequest) -> Result<BatchResponse, TransportError>;
    async fn job_status(&self, job_id: &str) -> Result<JobStatus, TransportError>;
    async fn languages(&self) -> Result<Vec<Language>, TransportError>;
}

/// reqwest-backed transport with pooling and retry.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TransportError::ApiError(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Send with retry. The request is rebuilt every attempt.
    async fn send_with_retry(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, TransportError> {
        let mut attempt: u32 = 0;
        let max_429_retries: u32 = 3;
        let max_5xx_retries: u32 = 2;
        let mut timeout_retried = false;

        loop {
            let mut req = self.http.request(method.clone(), url);
            if let Some(key) = &self.api_key {
                req = req.header("x-api-key", key);
            }
            if let Some(body) = body {
                req = req.json(body);
            }

            match req.send().await {
                Ok(resp) if resp.status().is_success() => {
                    return Ok(resp);
                }
                Ok(resp) if resp.status().as_u16() == 429 => {
                    let retry_after = retry_after_secs(
                        resp.headers().get("retry-after").and_then(|v| v.to_str().ok()),
                    );
                    if attempt >= max_429_retries {
                        return Err(TransportError::RateLimited {
                            retry_after_ms: retry_after.map_or(0, |secs| secs * 1000),
                        });
                    }
                    let wait = retry_after
                        .map(Duration::from_secs)
                        .unwrap_or_else(|| Duration::from_secs(1 << attempt));
                    warn!(attempt, wait_ms = wait.as_millis() as u64, "429 rate limited, retrying");
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Ok(resp) if resp.status().is_server_error() => {
                    if attempt >= max_5xx_retries {
                        return Err(TransportError::ApiError(format!(
                            "server error: {}",
                            resp.status()
                        )));
                    }
                    let wait = Duration::from_millis(500 * (1 << attempt));
                    warn!(
                        attempt,
                        status = resp.status().as_u16(),
                        wait_ms = wait.as_millis() as u64,
                        "5xx error, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Ok(resp) => {
                    let status = resp.status();
                    let body_text = resp.text().await.unwrap_or_default();
                    return Err(TransportError::ApiError(format!(
                        "unexpected status {}: {}",
                        status,
                        body_text.chars().take(200).collect::<String>()
                    )));
                }
                Err(e) if e.is_timeout() => {
                    if timeout_retried {
                        return Err(TransportError::Timeout);
                    }
                    warn!("request timeout, retrying once");
                    timeout_retried = true;
                }
                Err(e) => {
                    return Err(TransportError::ApiError(e.to_string()));
                }
            }
        }
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, TransportError> {
        let body = serde_json::to_value(body)
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        let url = format!("{}{}", self.base_url, path);
        let resp = self.send_with_retry(Method::POST, &url, Some(&body)).await?;
        resp.json::<T>()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.send_with_retry(Method::GET, &url, None).await?;
        resp.json::<T>()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))
    }
}

/// Seconds from a `Retry-After` header value, when it parses as an integer.
fn retry_after_secs(value: Option<&str>) -> Option<u64> {
    value.and_then(|s| s.trim().parse().ok())
}

#[async_trait]
impl Transport for HttpTransport {
    async fn translate(&self, req: &TranslateRequest) -> Result<String, TransportError> {
        let parsed: TranslateResponse = self.post_json("/api/translate", req).await?;
        if let Some(err) = parsed.error {
            return Err(TransportError::ApiError(err));
        }
        parsed
            .text
            .ok_or_else(|| TransportError::InvalidResponse("response missing text".into()))
    }

    async fn translate_batch(&self, req: &BatchRequest) -> Result<BatchResponse, TransportError> {
        let parsed: BatchResponse = self.post_json("/api/translate/batch", req).await?;
        if let Some(err) = parsed.error {
            return Err(TransportError::ApiError(err));
        }
        Ok(parsed)
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatus, TransportError> {
        self.get_json(&format!("/api/translate/status/{job_id}")).await
    }

    async fn languages(&self) -> Result<Vec<Language>, TransportError> {
        let parsed: LanguagesResponse = self.get_json("/api/languages").await?;
        Ok(parsed.languages)
    }
}
