//! Transport-level errors.
//! These never escape the public operations: the coordinator folds them into
//! result values carrying the original text as a fallback.

#[derive(Debug, Clone)]
pub enum TransportError {
    /// Remote API rejected the request or the connection failed.
    ApiError(String),
    /// Too many requests; retries exhausted.
    RateLimited { retry_after_ms: u64 },
    /// Request timed out after the transport's own retry.
    Timeout,
    /// Response body did not match the expected shape.
    InvalidResponse(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::ApiError(msg) => write!(f, "API error: {msg}"),
            TransportError::RateLimited { retry_after_ms } => {
                write!(f, "rate limited, retry after {retry_after_ms}ms")
            }
            TransportError::Timeout => write!(f, "request timeout"),
            TransportError::InvalidResponse(msg) => write!(f, "invalid response: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}
