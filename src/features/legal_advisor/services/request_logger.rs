use chrono::{DateTime, Utc};

use crate::shared::constants::MAX_LOGGED_QUESTION_CHARS;

/// Log target for admitted questions, filterable with `RUST_LOG`
pub const REQUEST_LOG_TARGET: &str = "legal_advisor::requests";

/// Observability record of admitted questions.
///
/// Writes a tracing event and nothing else; it cannot fail and never blocks
/// the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogger;

impl RequestLogger {
    pub fn record(&self, identity: &str, question: &str, at: DateTime<Utc>) {
        let question = truncate_question(question);
        tracing::info!(
            target: REQUEST_LOG_TARGET,
            client = %identity,
            question = %question,
            at = %at.to_rfc3339(),
            "[{}] {} asked: {}",
            at.format("%H:%M:%S"),
            identity,
            question
        );
    }
}

fn truncate_question(question: &str) -> String {
    let mut chars = question.chars();
    let head: String = chars.by_ref().take(MAX_LOGGED_QUESTION_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_question_kept() {
        assert_eq!(truncate_question("What is 66A?"), "What is 66A?");
    }

    #[test]
    fn test_long_question_truncated_on_char_boundary() {
        let long = "धारा".repeat(MAX_LOGGED_QUESTION_CHARS);
        let truncated = truncate_question(&long);

        assert_eq!(truncated.chars().count(), MAX_LOGGED_QUESTION_CHARS + 1);
        assert!(truncated.ends_with('…'));
    }

    #[test]
    fn test_record_does_not_panic_without_subscriber() {
        RequestLogger.record("1.2.3.4", "What is phishing?", Utc::now());
    }
}
