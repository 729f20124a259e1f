use std::sync::Arc;

use axum::{extract::State, Json};
use tokio::time::Instant;

use crate::core::error::Result;
use crate::core::extractor::ClientIdentity;
use crate::features::rate_limits::dtos::RateLimitStatusDto;
use crate::features::rate_limits::services::RateLimiter;
use crate::shared::types::ApiResponse;

/// Get the caller's current rate limit status
///
/// Read-only: checking the status never counts as a request.
#[utoipa::path(
    get,
    path = "/api/rate-limit",
    responses(
        (status = 200, description = "Caller's rate limit status", body = ApiResponse<RateLimitStatusDto>)
    ),
    tag = "rate-limits"
)]
pub async fn get_rate_limit_status(
    identity: ClientIdentity,
    State(rate_limiter): State<Arc<RateLimiter>>,
) -> Result<Json<ApiResponse<RateLimitStatusDto>>> {
    let status = rate_limiter.status(&identity, Instant::now());
    Ok(Json(ApiResponse::success(Some(status.into()), None)))
}
