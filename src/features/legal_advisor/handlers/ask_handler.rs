use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, ClientIdentity};
use crate::features::legal_advisor::dtos::{AskRequestDto, AskResponseDto};
use crate::features::legal_advisor::services::{AnswerError, AnswerService};
use crate::shared::constants::{AGENT_ERROR_PREFIX, MISSING_QUESTION_MESSAGE};

/// Shared state for the `/ask` route
#[derive(Clone)]
pub struct AskState {
    pub answer_service: Arc<AnswerService>,
    /// Report agent failures with 200 instead of 502
    pub errors_in_band: bool,
}

/// Ask a legal question
///
/// Agent failures keep the success body shape with the error in `answer`.
#[utoipa::path(
    post,
    path = "/ask",
    request_body = AskRequestDto,
    responses(
        (status = 200, description = "Answer from the legal advisor", body = AskResponseDto),
        (status = 400, description = "Missing or empty question"),
        (status = 429, description = "Too many requests from this client"),
        (status = 502, description = "Agent failed; error carried in `answer`", body = AskResponseDto)
    ),
    tag = "legal-advisor"
)]
pub async fn ask(
    State(state): State<AskState>,
    identity: ClientIdentity,
    AppJson(payload): AppJson<AskRequestDto>,
) -> Result<(StatusCode, Json<AskResponseDto>)> {
    payload
        .validate()
        .map_err(|_| AppError::BadRequest(MISSING_QUESTION_MESSAGE.to_string()))?;
    // Present once validated
    let question = payload.question.unwrap_or_default();

    match state.answer_service.handle(&identity, &question).await {
        Ok(answer) => Ok((
            StatusCode::OK,
            Json(AskResponseDto {
                user: identity.into_string(),
                question: question.trim().to_string(),
                answer: answer.text,
                timestamp: answer.answered_at,
                requests_last_minute: answer.requests_in_window.unwrap_or_default(),
            }),
        )),
        Err(AnswerError::Agent(message)) => {
            let status = if state.errors_in_band {
                StatusCode::OK
            } else {
                StatusCode::BAD_GATEWAY
            };
            let requests_last_minute = state.answer_service.requests_in_window(&identity);

            Ok((
                status,
                Json(AskResponseDto {
                    user: identity.into_string(),
                    question: question.trim().to_string(),
                    answer: format!("{}{}", AGENT_ERROR_PREFIX, message),
                    timestamp: Utc::now(),
                    requests_last_minute,
                }),
            ))
        }
        Err(other) => Err(other.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::RateLimitConfig;
    use crate::features::legal_advisor::routes;
    use crate::features::rate_limits::{ActivityLog, RateLimiter};
    use crate::modules::agent::LegalAgent;
    use crate::shared::constants::{EMPTY_QUESTION_MESSAGE, RATE_LIMITED_MESSAGE};
    use crate::shared::test_helpers::{
        forwarded_for, with_forwarded_identity, FailingAgent, StubAgent,
    };
    use crate::shared::types::ApiResponse;
    use axum::http::header;
    use axum_test::TestServer;
    use serde_json::json;
    use std::time::Duration;

    fn server(agent: Arc<dyn LegalAgent>, errors_in_band: bool) -> TestServer {
        let limiter = Arc::new(RateLimiter::new(
            RateLimitConfig::new(5, 60),
            ActivityLog::new(),
        ));
        let state = AskState {
            answer_service: Arc::new(AnswerService::new(
                agent,
                limiter,
                Duration::from_secs(30),
            )),
            errors_in_band,
        };

        TestServer::new(with_forwarded_identity(routes::routes(state))).unwrap()
    }

    #[tokio::test]
    async fn test_ask_returns_answer() {
        let server = server(
            Arc::new(StubAgent::text("Section 66C **IT Act** covers identity theft.")),
            false,
        );

        let (name, value) = forwarded_for("10.0.0.7");
        let response = server
            .post("/ask")
            .add_header(name, value)
            .json(&json!({ "question": "  What is identity theft?  " }))
            .await;
        response.assert_status_ok();

        let body: AskResponseDto = response.json();
        assert_eq!(body.user, "10.0.0.7");
        assert_eq!(body.question, "What is identity theft?");
        assert_eq!(body.answer, "Section 66C IT Act covers identity theft.");
        assert_eq!(body.requests_last_minute, 1);
    }

    #[tokio::test]
    async fn test_missing_question_is_bad_request() {
        let server = server(Arc::new(StubAgent::text("unused")), false);

        for payload in [json!({}), json!({ "question": null })] {
            let response = server.post("/ask").json(&payload).await;
            response.assert_status(StatusCode::BAD_REQUEST);

            let body: ApiResponse<()> = response.json();
            assert!(!body.success);
            assert_eq!(body.message.as_deref(), Some(MISSING_QUESTION_MESSAGE));
        }
    }

    #[tokio::test]
    async fn test_blank_question_is_bad_request() {
        let server = server(Arc::new(StubAgent::text("unused")), false);

        let response = server.post("/ask").json(&json!({ "question": "   " })).await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: ApiResponse<()> = response.json();
        assert_eq!(body.message.as_deref(), Some(EMPTY_QUESTION_MESSAGE));
    }

    #[tokio::test]
    async fn test_sixth_request_is_throttled() {
        let agent = Arc::new(StubAgent::text("ok"));
        let server = server(agent.clone(), false);

        for _ in 0..5 {
            let (name, value) = forwarded_for("10.0.0.8");
            server
                .post("/ask")
                .add_header(name, value)
                .json(&json!({ "question": "What is Section 420?" }))
                .await
                .assert_status_ok();
        }

        let (name, value) = forwarded_for("10.0.0.8");
        let response = server
            .post("/ask")
            .add_header(name, value)
            .json(&json!({ "question": "What is Section 420?" }))
            .await;
        response.assert_status(StatusCode::TOO_MANY_REQUESTS);

        let retry_after: u64 = response
            .header(header::RETRY_AFTER)
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!((1..=60).contains(&retry_after));

        let body: ApiResponse<()> = response.json();
        assert_eq!(body.message.as_deref(), Some(RATE_LIMITED_MESSAGE));
        assert_eq!(agent.calls(), 5);

        // Another client is unaffected
        let (name, value) = forwarded_for("10.0.0.9");
        server
            .post("/ask")
            .add_header(name, value)
            .json(&json!({ "question": "What is Section 420?" }))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_agent_failure_is_bad_gateway_with_answer_body() {
        let server = server(Arc::new(FailingAgent), false);

        let (name, value) = forwarded_for("10.0.0.10");
        let response = server
            .post("/ask")
            .add_header(name, value)
            .json(&json!({ "question": "What is cyber stalking?" }))
            .await;
        response.assert_status(StatusCode::BAD_GATEWAY);

        let body: AskResponseDto = response.json();
        assert_eq!(body.user, "10.0.0.10");
        assert_eq!(
            body.answer,
            "⚠️ Error: network error: connection reset by peer"
        );
        assert_eq!(body.requests_last_minute, 1);
    }

    #[tokio::test]
    async fn test_agent_failure_in_band() {
        let server = server(Arc::new(FailingAgent), true);

        let response = server
            .post("/ask")
            .json(&json!({ "question": "What is cyber stalking?" }))
            .await;
        response.assert_status_ok();

        let body: AskResponseDto = response.json();
        assert!(body.answer.starts_with(AGENT_ERROR_PREFIX));
    }
}
