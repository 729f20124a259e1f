use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Request DTO for asking a legal question
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AskRequestDto {
    /// The question, e.g. "What are the penalties for phishing under the IT Act 2000?"
    #[validate(required(message = "Missing 'question' field"))]
    pub question: Option<String>,
}

/// Response DTO for `/ask`, also used for in-band agent failures
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AskResponseDto {
    /// Caller identity (network address)
    pub user: String,
    /// The question as answered (trimmed)
    pub question: String,
    /// The answer, or "⚠️ Error: ..." when the agent failed
    pub answer: String,
    pub timestamp: DateTime<Utc>,
    /// Requests counted for this caller in the current window
    pub requests_last_minute: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_question_fails_validation() {
        let dto: AskRequestDto = serde_json::from_str("{}").unwrap();
        assert!(dto.validate().is_err());

        let dto: AskRequestDto = serde_json::from_str(r#"{"question": null}"#).unwrap();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_present_question_passes_validation() {
        // Blank questions are rejected later by the answer service
        let dto: AskRequestDto = serde_json::from_str(r#"{"question": "  "}"#).unwrap();
        assert!(dto.validate().is_ok());
        assert_eq!(dto.question.as_deref(), Some("  "));
    }
}
