//! HTTP client for the knowledge service
//!
//! Endpoints, relative to `KNOWLEDGE_BASE_URL`:
//! - `POST /collections/{collection}/ingest` with `{"urls": [...]}`
//! - `POST /collections/{collection}/search` with `{"query": "...", "limit": n}`,
//!   answering `{"results": [{"text", "source", "score"}]}`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{KnowledgeError, KnowledgeSnippet, KnowledgeStore};

/// Searches sit on the request path and must stay short
const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct IngestRequest<'a> {
    urls: &'a [String],
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<KnowledgeSnippet>,
}

pub struct HttpKnowledgeStore {
    client: Client,
    base_url: String,
    collection: String,
}

impl HttpKnowledgeStore {
    pub fn new(base_url: &str, collection: &str) -> Result<Self, KnowledgeError> {
        let client = Client::builder()
            .user_agent("LegalAdvisorCore/0.1 (knowledge-client)")
            .build()
            .map_err(|e| KnowledgeError::Request(format!("failed to build client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            collection: collection.to_string(),
        })
    }

    fn collection_url(&self, action: &str) -> String {
        format!(
            "{}/collections/{}/{}",
            self.base_url,
            urlencoding::encode(&self.collection),
            action
        )
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, KnowledgeError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(KnowledgeError::Service {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl KnowledgeStore for HttpKnowledgeStore {
    async fn ingest(&self, sources: &[String]) -> Result<(), KnowledgeError> {
        let url = self.collection_url("ingest");
        debug!("Ingesting {} sources via {}", sources.len(), url);

        let response = self
            .client
            .post(&url)
            .json(&IngestRequest { urls: sources })
            .send()
            .await
            .map_err(|e| KnowledgeError::Request(e.to_string()))?;

        Self::check_status(response).await?;
        Ok(())
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<KnowledgeSnippet>, KnowledgeError> {
        let response = self
            .client
            .post(self.collection_url("search"))
            .timeout(SEARCH_TIMEOUT)
            .json(&SearchRequest { query, limit })
            .send()
            .await
            .map_err(|e| KnowledgeError::Request(e.to_string()))?;

        let body: SearchResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| KnowledgeError::Request(format!("invalid search response: {}", e)))?;

        let mut results = body.results;
        results.truncate(limit);
        Ok(results)
    }
}
