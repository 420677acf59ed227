use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::types::{AppState, ProblemDetails};

pub const MAX_URI_LENGTH: usize = 1024;

/// Rejects oversized request URIs before any handler runs.
pub async fn uri_length_limit(req: Request, next: Next) -> Response {
    let size = req.uri().to_string().len();
    if size > MAX_URI_LENGTH {
        tracing::error!("The request URI is too long ({size}>{MAX_URI_LENGTH})");
        return ProblemDetails::new(414, "Equipment identity check failed", "URI Too Long")
            .with_cause("INCORRECT_URI_LENGTH")
            .into_response();
    }
    next.run(req).await
}

/// Requires a bearer token once the NRF has flagged OAuth2 as mandatory.
/// Token verification itself is the concern of the security layer; this
/// only refuses requests that present no credentials at all.
pub async fn authorization_check(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    if state.ctx.oauth2_required() && req.headers().get(header::AUTHORIZATION).is_none() {
        tracing::debug!("Authorization check failed: no access token presented");
        return ProblemDetails::new(401, "Unauthorized", "Missing Authorization header")
            .into_response();
    }
    next.run(req).await
}
