//! Rate limiting port.

use async_trait::async_trait;
use std::time::Duration;

/// Per-client request throttling.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Record a request from `key` (usually the client address) and report
    /// whether it may proceed.
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError>;
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    /// How long until the next request would be allowed.
    pub reset_after: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Invalid rate limit configuration: {0}")]
    InvalidConfig(String),

    #[error("Backend error: {0}")]
    Backend(String),
}
