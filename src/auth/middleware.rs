//! Axum middleware guarding the protected routes.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::gate::authorize;
use crate::http::response::ApiResponse;
use crate::http::server::AppState;

/// Reject the request with 401 unless it carries the configured bearer
/// token. The wrapped handler is never reached on rejection.
pub async fn require_bearer(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let header = request.headers().get(AUTHORIZATION).map(|v| v.as_bytes());

    match authorize(header, &state.auth) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            tracing::warn!(
                reason = e.code(),
                method = %request.method(),
                path = %request.uri().path(),
                "Rejected unauthenticated request"
            );
            ApiResponse::error(StatusCode::UNAUTHORIZED, e.code(), e.to_string()).into_response()
        }
    }
}
