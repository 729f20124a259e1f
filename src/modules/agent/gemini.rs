//! Gemini-backed legal agent
//!
//! Retrieves supporting passages from the knowledge store, then calls
//! `models/{model}:generateContent` with the advisor persona as the system
//! instruction.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::core::config::AgentConfig;
use crate::modules::knowledge::{KnowledgeSnippet, KnowledgeStore};
use crate::shared::constants::{AGENT_INSTRUCTIONS, AGENT_NAME};

use super::{AgentError, AgentMessage, AgentReply, LegalAgent, RunResponse};

// ============================================================================
// Gemini API types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl Content {
    fn text(role: Option<&str>, text: String) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part { text: Some(text) }],
        }
    }

    fn joined_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}

// ============================================================================
// Prompt construction
// ============================================================================

fn system_instruction() -> String {
    let mut prompt = format!("You are {}.\n", AGENT_NAME);
    for line in AGENT_INSTRUCTIONS {
        prompt.push_str("- ");
        prompt.push_str(line);
        prompt.push('\n');
    }
    prompt.push_str("Format your answer in Markdown.");
    prompt
}

/// The user turn: retrieved passages (if any) followed by the question
fn build_user_prompt(query: &str, snippets: &[KnowledgeSnippet]) -> String {
    if snippets.is_empty() {
        return query.to_string();
    }

    let mut prompt = String::from("Relevant excerpts from the legal knowledge base:\n\n");
    for (i, snippet) in snippets.iter().enumerate() {
        match &snippet.source {
            Some(source) => prompt.push_str(&format!("[{}] ({}) {}\n", i + 1, source, snippet.text)),
            None => prompt.push_str(&format!("[{}] {}\n", i + 1, snippet.text)),
        }
    }
    prompt.push_str("\nQuestion: ");
    prompt.push_str(query);
    prompt
}

fn classify_failure(status: StatusCode, body: &str) -> AgentError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());

    if status == StatusCode::TOO_MANY_REQUESTS {
        AgentError::Quota(message)
    } else {
        AgentError::Provider {
            status: status.as_u16(),
            message,
        }
    }
}

fn into_run_response(
    query: &str,
    model: &str,
    response: GenerateContentResponse,
) -> Result<RunResponse, AgentError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(AgentError::InvalidResponse(format!(
            "empty response ({})",
            reason
        )));
    };

    let text = candidate
        .content
        .as_ref()
        .map(Content::joined_text)
        .unwrap_or_default();

    // Without model text the run would only hold the user's own question
    if text.trim().is_empty() {
        let reason = candidate
            .finish_reason
            .unwrap_or_else(|| "no text returned".to_string());
        return Err(AgentError::InvalidResponse(format!(
            "empty answer ({})",
            reason
        )));
    }

    let mut extra = Map::new();
    extra.insert(
        "model".to_string(),
        Value::String(response.model_version.unwrap_or_else(|| model.to_string())),
    );
    if let Some(reason) = candidate.finish_reason {
        extra.insert("finish_reason".to_string(), Value::String(reason));
    }

    Ok(RunResponse {
        messages: vec![AgentMessage::user(query), AgentMessage::assistant(text.clone())],
        output_text: Some(text),
        extra,
    })
}

// ============================================================================
// Agent
// ============================================================================

pub struct GeminiAgent {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    knowledge: Arc<dyn KnowledgeStore>,
    search_limit: usize,
}

impl GeminiAgent {
    pub fn new(
        config: &AgentConfig,
        knowledge: Arc<dyn KnowledgeStore>,
        search_limit: usize,
    ) -> Result<Self, String> {
        let api_key = config.require_api_key()?.to_string();
        let client = Client::builder()
            .user_agent("LegalAdvisorCore/0.1 (gemini-agent)")
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

        info!("Creating {} agent (model: {})", AGENT_NAME, config.model);

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            api_key,
            model: config.model.clone(),
            knowledge,
            search_limit,
        })
    }

    async fn retrieve(&self, query: &str) -> Vec<KnowledgeSnippet> {
        if self.search_limit == 0 {
            return Vec::new();
        }

        match self.knowledge.search(query, self.search_limit).await {
            Ok(snippets) => {
                debug!("Retrieved {} knowledge passages", snippets.len());
                snippets
            }
            Err(e) => {
                warn!("Knowledge search failed, answering without context: {}", e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl LegalAgent for GeminiAgent {
    async fn answer(&self, query: &str) -> Result<AgentReply, AgentError> {
        let snippets = self.retrieve(query).await;

        let request = GenerateContentRequest {
            system_instruction: Content::text(None, system_instruction()),
            contents: vec![Content::text(
                Some("user"),
                build_user_prompt(query, &snippets),
            )],
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.api_base,
            urlencoding::encode(&self.model)
        );
        debug!("Gemini request to model {}", self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AgentError::InvalidResponse(e.to_string()))?;

        into_run_response(query, &self.model, body).map(AgentReply::Run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_instruction_carries_persona() {
        let prompt = system_instruction();
        assert!(prompt.starts_with("You are IndianLegalAdvisor."));
        assert!(prompt.contains("IT Act 2000"));
        assert!(prompt.contains("licensed advocate"));
    }

    #[test]
    fn test_user_prompt_without_context_is_the_question() {
        assert_eq!(build_user_prompt("What is 420 IPC?", &[]), "What is 420 IPC?");
    }

    #[test]
    fn test_user_prompt_lists_snippets() {
        let snippets = vec![KnowledgeSnippet {
            text: "Whoever cheats ...".to_string(),
            source: Some("IPC 1860".to_string()),
            score: Some(0.9),
        }];
        let prompt = build_user_prompt("What is cheating?", &snippets);

        assert!(prompt.contains("[1] (IPC 1860) Whoever cheats ..."));
        assert!(prompt.ends_with("Question: What is cheating?"));
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let request = GenerateContentRequest {
            system_instruction: Content::text(None, "sys".to_string()),
            contents: vec![Content::text(Some("user"), "q".to_string())],
        };
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "sys");
        assert!(value["systemInstruction"].get("role").is_none());
        assert_eq!(value["contents"][0]["role"], "user");
    }

    #[test]
    fn test_response_becomes_run_response() {
        let body: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Section 66D "}, {"text": "covers cheating by personation."}]},
                    "finishReason": "STOP"
                }],
                "modelVersion": "gemini-2.5-pro-001"
            }"#,
        )
        .unwrap();

        let run = into_run_response("q", "gemini-2.5-pro", body).unwrap();
        assert_eq!(
            run.output_text.as_deref(),
            Some("Section 66D covers cheating by personation.")
        );
        assert_eq!(run.messages.len(), 2);
        assert_eq!(run.extra["model"], "gemini-2.5-pro-001");
        assert_eq!(run.extra["finish_reason"], "STOP");
    }

    #[test]
    fn test_blocked_prompt_is_invalid_response() {
        let body: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap();

        match into_run_response("q", "m", body) {
            Err(AgentError::InvalidResponse(msg)) => assert!(msg.contains("SAFETY")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_candidate_without_text_is_invalid_response() {
        let body: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[]},"finishReason":"MAX_TOKENS"}]}"#,
        )
        .unwrap();

        match into_run_response("What is Section 66C?", "m", body) {
            Err(AgentError::InvalidResponse(msg)) => {
                assert_eq!(msg, "empty answer (MAX_TOKENS)");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_candidate_without_content_is_invalid_response() {
        let body: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();

        assert!(matches!(
            into_run_response("What is Section 66C?", "m", body),
            Err(AgentError::InvalidResponse(msg)) if msg == "empty answer (SAFETY)"
        ));
    }

    #[test]
    fn test_classify_failure() {
        let body = r#"{"error": {"code": 429, "message": "Resource has been exhausted"}}"#;
        assert!(matches!(
            classify_failure(StatusCode::TOO_MANY_REQUESTS, body),
            AgentError::Quota(msg) if msg == "Resource has been exhausted"
        ));

        assert!(matches!(
            classify_failure(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            AgentError::Provider { status: 500, ref message } if message == "boom"
        ));
    }
}
