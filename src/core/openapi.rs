use utoipa::{Modify, OpenApi};

use crate::features::legal_advisor::{dtos as legal_advisor_dtos, handlers as legal_advisor_handlers};
use crate::features::rate_limits::{dtos as rate_limits_dtos, handlers as rate_limits_handlers};
use crate::shared::types::ApiResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Legal advisor (public, rate limited)
        legal_advisor_handlers::ask_handler::ask,
        // Rate limits (public)
        rate_limits_handlers::rate_limit_handler::get_rate_limit_status,
    ),
    components(
        schemas(
            // Legal advisor
            legal_advisor_dtos::AskRequestDto,
            legal_advisor_dtos::AskResponseDto,
            // Rate limits
            rate_limits_dtos::RateLimitStatusDto,
            ApiResponse<rate_limits_dtos::RateLimitStatusDto>,
        )
    ),
    tags(
        (name = "legal-advisor", description = "Questions on Indian law (IPC, IT Act 2000, cybercrime)"),
        (name = "rate-limits", description = "Per-client sliding-window quota"),
    ),
    info(
        title = "Legal Advisor API",
        version = "0.1.0",
        description = "AI legal information assistant for Indian law",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
