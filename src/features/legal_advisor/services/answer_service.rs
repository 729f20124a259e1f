use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::time::{timeout, Instant};

use crate::core::error::AppError;
use crate::features::rate_limits::{Admission, RateLimiter};
use crate::modules::agent::{AgentError, LegalAgent};
use crate::shared::constants::{EMPTY_QUESTION_MESSAGE, RATE_LIMITED_MESSAGE};

use super::formatting::format_answer;
use super::request_logger::RequestLogger;

/// A successful answer
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub answered_at: DateTime<Utc>,
    /// Caller's request count in the window, `None` when unthrottled
    pub requests_in_window: Option<usize>,
}

/// Why a question did not produce an answer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnswerError {
    /// Bad client input; never retried
    #[error("{0}")]
    Validation(String),

    /// Caller exceeded the quota; retry after the hint
    #[error("{message}")]
    RateLimited {
        message: String,
        retry_after: Duration,
    },

    /// The agent failed, timed out or could not be reached
    #[error("{0}")]
    Agent(String),
}

pub type AnswerResult = Result<Answer, AnswerError>;

impl From<AnswerError> for AppError {
    fn from(err: AnswerError) -> Self {
        match err {
            AnswerError::Validation(msg) => AppError::Validation(msg),
            AnswerError::RateLimited {
                message,
                retry_after,
            } => AppError::RateLimitExceeded {
                message,
                retry_after,
            },
            AnswerError::Agent(msg) => AppError::ExternalServiceError(msg),
        }
    }
}

/// Request lifecycle shared by every front end
pub struct AnswerService {
    agent: Arc<dyn LegalAgent>,
    rate_limiter: Option<Arc<RateLimiter>>,
    logger: RequestLogger,
    agent_timeout: Duration,
}

impl AnswerService {
    pub fn new(
        agent: Arc<dyn LegalAgent>,
        rate_limiter: Arc<RateLimiter>,
        agent_timeout: Duration,
    ) -> Self {
        Self {
            agent,
            rate_limiter: Some(rate_limiter),
            logger: RequestLogger,
            agent_timeout,
        }
    }

    /// Service without admission control, used by the interactive console
    pub fn unthrottled(agent: Arc<dyn LegalAgent>, agent_timeout: Duration) -> Self {
        Self {
            agent,
            rate_limiter: None,
            logger: RequestLogger,
            agent_timeout,
        }
    }

    /// Answer `raw_query` on behalf of `identity`.
    ///
    /// Validation runs before throttling, so an empty question never uses
    /// quota and is reported as a validation error even for a limited client.
    /// Rejected questions are neither logged nor forwarded to the agent.
    pub async fn handle(&self, identity: &str, raw_query: &str) -> AnswerResult {
        let query = raw_query.trim();
        if query.is_empty() {
            return Err(AnswerError::Validation(EMPTY_QUESTION_MESSAGE.to_string()));
        }

        let requests_in_window = match &self.rate_limiter {
            Some(limiter) => match limiter.check_and_record(identity, Instant::now()) {
                Admission::Admitted { requests_in_window } => Some(requests_in_window),
                Admission::Rejected { retry_after } => {
                    tracing::debug!(
                        "Rejected question from {} (retry after {:?})",
                        identity,
                        retry_after
                    );
                    return Err(AnswerError::RateLimited {
                        message: RATE_LIMITED_MESSAGE.to_string(),
                        retry_after,
                    });
                }
            },
            None => None,
        };

        self.logger.record(identity, query, Utc::now());

        let reply = match timeout(self.agent_timeout, self.agent.answer(query)).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                tracing::warn!("Agent failed for {}: {}", identity, e);
                return Err(AnswerError::Agent(e.to_string()));
            }
            Err(_) => {
                let e = AgentError::Timeout(self.agent_timeout);
                tracing::warn!("Agent failed for {}: {}", identity, e);
                return Err(AnswerError::Agent(e.to_string()));
            }
        };

        Ok(Answer {
            text: format_answer(&reply.into_text()),
            answered_at: Utc::now(),
            requests_in_window,
        })
    }

    /// Caller's request count in the current window, without recording
    pub fn requests_in_window(&self, identity: &str) -> usize {
        self.rate_limiter
            .as_ref()
            .map(|limiter| limiter.requests_in_window(identity, Instant::now()))
            .unwrap_or(0)
    }
}
