use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::error::retry_after_secs;
use crate::features::rate_limits::services::RateLimitStatus;

/// Response DTO for the caller's rate limit status
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RateLimitStatusDto {
    /// Requests counted in the current window
    pub requests_in_window: usize,
    /// Requests left before the limit is hit
    pub requests_remaining: usize,
    /// Maximum requests allowed per window
    pub max_requests: usize,
    /// Window length in seconds
    pub window_seconds: u64,
    /// Seconds until the next request would be admitted, when currently limited
    pub retry_after_secs: Option<u64>,
}

impl From<RateLimitStatus> for RateLimitStatusDto {
    fn from(status: RateLimitStatus) -> Self {
        Self {
            requests_in_window: status.requests_in_window,
            requests_remaining: status.requests_remaining(),
            max_requests: status.max_requests,
            window_seconds: status.window.as_secs(),
            retry_after_secs: status.retry_after.map(retry_after_secs),
        }
    }
}
