use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What an agent hands back for a question.
///
/// Agents either return plain text or a run record. A run record may carry a
/// primary `output_text`, the message list of the run, or neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgentReply {
    Text(String),
    Run(RunResponse),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_text: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<AgentMessage>,

    /// Provider metadata (model version, finish reason, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl AgentMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: Some(content.into()),
        }
    }
}

impl AgentReply {
    /// Collapse the reply into a single trimmed answer string.
    ///
    /// First match wins:
    /// 1. non-empty `output_text`
    /// 2. content of the last message
    /// 3. the whole reply rendered as JSON
    pub fn into_text(self) -> String {
        match self {
            AgentReply::Text(text) => text.trim().to_string(),
            AgentReply::Run(run) => run.into_text(),
        }
    }
}

impl RunResponse {
    pub fn into_text(self) -> String {
        if let Some(output) = self
            .output_text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            return output.to_string();
        }

        if let Some(content) = self.messages.last().and_then(|m| m.content.as_deref()) {
            return content.trim().to_string();
        }

        serde_json::to_string(&self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

impl From<String> for AgentReply {
    fn from(text: String) -> Self {
        AgentReply::Text(text)
    }
}

impl From<RunResponse> for AgentReply {
    fn from(run: RunResponse) -> Self {
        AgentReply::Run(run)
    }
}
