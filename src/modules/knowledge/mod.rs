//! Knowledge-store collaborator
//!
//! Document ingestion and passage search are delegated to an external
//! knowledge service. `DisabledKnowledgeStore` stands in when none is
//! configured so the agent still answers, just without retrieved context.

mod http_store;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http_store::HttpKnowledgeStore;

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("knowledge store is not configured (set KNOWLEDGE_BASE_URL)")]
    NotConfigured,

    #[error("knowledge service request failed: {0}")]
    Request(String),

    #[error("knowledge service returned {status}: {message}")]
    Service { status: u16, message: String },
}

/// A retrieved passage of a legal document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSnippet {
    pub text: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub score: Option<f32>,
}

#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Fetch, chunk and index the given documents
    async fn ingest(&self, sources: &[String]) -> Result<(), KnowledgeError>;

    /// Most relevant passages for a query, best first
    async fn search(&self, query: &str, limit: usize)
        -> Result<Vec<KnowledgeSnippet>, KnowledgeError>;
}

pub struct DisabledKnowledgeStore;

#[async_trait]
impl KnowledgeStore for DisabledKnowledgeStore {
    async fn ingest(&self, _sources: &[String]) -> Result<(), KnowledgeError> {
        Err(KnowledgeError::NotConfigured)
    }

    async fn search(
        &self,
        _query: &str,
        _limit: usize,
    ) -> Result<Vec<KnowledgeSnippet>, KnowledgeError> {
        Ok(Vec::new())
    }
}
