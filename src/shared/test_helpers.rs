//! Shared fixtures for handler and service tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    http::{HeaderName, HeaderValue},
    Extension, Router,
};

use crate::core::extractor::IdentityPolicy;
use crate::modules::agent::{AgentError, AgentReply, LegalAgent};

/// Trust `X-Forwarded-For` so tests can pick the caller identity
pub fn with_forwarded_identity(router: Router) -> Router {
    router.layer(Extension(IdentityPolicy {
        trust_forwarded_for: true,
    }))
}

pub fn forwarded_for(ip: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-forwarded-for"),
        HeaderValue::from_str(ip).unwrap(),
    )
}

/// Agent returning a fixed reply and counting how often it was asked
pub struct StubAgent {
    reply: AgentReply,
    calls: AtomicUsize,
}

impl StubAgent {
    pub fn new(reply: impl Into<AgentReply>) -> Self {
        Self {
            reply: reply.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn text(text: &str) -> Self {
        Self::new(text.to_string())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LegalAgent for StubAgent {
    async fn answer(&self, _query: &str) -> Result<AgentReply, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

/// Agent that always fails with a network error
pub struct FailingAgent;

#[async_trait]
impl LegalAgent for FailingAgent {
    async fn answer(&self, _query: &str) -> Result<AgentReply, AgentError> {
        Err(AgentError::Network("connection reset by peer".to_string()))
    }
}

/// Agent that never answers within any reasonable timeout
pub struct HangingAgent;

#[async_trait]
impl LegalAgent for HangingAgent {
    async fn answer(&self, _query: &str) -> Result<AgentReply, AgentError> {
        tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
        Ok(AgentReply::Text("too late".to_string()))
    }
}
