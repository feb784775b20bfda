//! Web server module.
//!
//! Slack-facing routes sit behind signature verification; `/health` does not.

pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::slack::verify_slack_request;

pub use handlers::{health, infra_search, AppState, HealthResponse, PENDING_TEXT};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let slack = Router::new()
        .route("/slack/infra-search", post(infra_search))
        .route_layer(middleware::from_fn_with_state(
            state.verifier.clone(),
            verify_slack_request,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(slack)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
