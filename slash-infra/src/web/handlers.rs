//! HTTP endpoint handlers.
//!
//! Slash command handlers answer within microseconds: they parse the
//! command, start a `DelayedSlashResponse` and return its immediate reply.
//! The lookup itself happens in the background.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response as HttpResponse},
    Json,
};
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::format::format_ec2_instance;
use crate::search::{ResultSet, Resolver, EC2_INSTANCE_KIND};
use crate::slack::{
    DelayedSlashResponse, FinalResponse, MessageResponder, Response, SignatureVerifier,
    SlashCommandRequest,
};
use crate::Config;

/// Shown while the lookup is still running.
pub const PENDING_TEXT: &str = "One second while we look that up...";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Shared by every callback delivery
    pub http_client: Client,
    pub verifier: SignatureVerifier,
    pub resolver: Arc<dyn Resolver>,
}

impl AppState {
    pub fn new(
        config: Config,
        http_client: Client,
        verifier: SignatureVerifier,
        resolver: Arc<dyn Resolver>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            http_client,
            verifier,
            resolver,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Infrastructure Search
// =============================================================================

/// `/infra <query>` slash command endpoint.
///
/// Expects the body to have passed signature verification already.
pub async fn infra_search(State(state): State<AppState>, body: Bytes) -> HttpResponse {
    let command = match SlashCommandRequest::from_form(&body) {
        Ok(command) => command,
        Err(e) => {
            warn!(error = %e, "slash_command_parse_failed");
            return (StatusCode::BAD_REQUEST, "could not parse payload").into_response();
        }
    };

    info!(
        command = %command.command,
        team_id = %command.team_id,
        channel_id = %command.channel_id,
        user_id = %command.user_id,
        query_length = command.text.len(),
        "slash_command_received"
    );

    let responder = MessageResponder::new(state.http_client.clone(), command.response_url.clone());
    let resolver = state.resolver.clone();

    DelayedSlashResponse::new(Response::text(PENDING_TEXT), move |ctx, command| async move {
        let result_sets = resolver.search(&ctx, &command.text).await;
        search_response(&command.text, &result_sets)
    })
    .grace_period(state.config.pending_grace())
    .run(responder, command)
}

/// Build the public reply for a finished search.
///
/// Only unambiguous matches (a set with exactly one instance) are shown.
fn search_response(query: &str, result_sets: &[ResultSet]) -> FinalResponse {
    let attachments: Vec<_> = result_sets
        .iter()
        .filter(|set| set.kind == EC2_INSTANCE_KIND && set.results.len() == 1)
        .map(|set| format_ec2_instance(&set.results[0]))
        .collect();

    info!(
        result_sets = result_sets.len(),
        attachments = attachments.len(),
        "infra_search_complete"
    );

    if attachments.is_empty() {
        return FinalResponse::public(Response::text(format!(
            "Sorry, I couldn't find anything matching `{}`",
            query.trim()
        )));
    }

    FinalResponse::public(Response::with_attachments(attachments))
}
