use axum::{routing::post, Router};

use super::handlers::{ask, AskState};

/// Create routes for the legal advisor feature
pub fn routes(state: AskState) -> Router {
    Router::new().route("/ask", post(ask)).with_state(state)
}
