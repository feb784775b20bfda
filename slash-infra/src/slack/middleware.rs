//! axum middleware rejecting requests that were not signed by Slack.
//!
//! Mount it with `middleware::from_fn_with_state(verifier, verify_slack_request)`.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use super::signature::{SignatureVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER};

/// Largest body we are willing to buffer for verification.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Verify the Slack signature, then hand the untouched body to `next`.
pub async fn verify_slack_request(
    State(verifier): State<SignatureVerifier>,
    req: Request,
    next: Next,
) -> Response {
    let (parts, body) = req.into_parts();

    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "slack_request_body_unreadable");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let timestamp = header_str(&parts.headers, TIMESTAMP_HEADER);
    let signature = header_str(&parts.headers, SIGNATURE_HEADER);

    if let Err(e) = verifier.verify(timestamp, signature, &bytes) {
        warn!(
            path = %parts.uri.path(),
            reason = %e,
            has_signature = !signature.is_empty(),
            "slack_request_rejected"
        );
        return (StatusCode::UNAUTHORIZED, e.to_string()).into_response();
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}
