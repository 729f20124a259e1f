//! Agent collaborator: answers a legal question, optionally grounded in
//! passages from the knowledge store.

mod gemini;
mod reply;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use gemini::GeminiAgent;
pub use reply::{AgentMessage, AgentReply, RunResponse};

/// Failure reported by an agent implementation
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("network error: {0}")]
    Network(String),

    #[error("model error ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("provider quota exceeded: {0}")]
    Quota(String),

    #[error("invalid response from model: {0}")]
    InvalidResponse(String),

    #[error("agent did not answer within {}s", .0.as_secs())]
    Timeout(Duration),
}

/// A question-answering agent over Indian law
#[async_trait]
pub trait LegalAgent: Send + Sync {
    async fn answer(&self, query: &str) -> Result<AgentReply, AgentError>;
}
