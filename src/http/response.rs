//! Response construction.
//!
//! # Responsibilities
//! - Build each response as one value: status, content type and body
//! - Shared JSON shapes for acknowledgements and errors
//!
//! # Design Decisions
//! - Handlers return `ApiResponse` and never write headers and body in
//!   separate steps, so a status cannot change after the body is chosen
//! - Store payloads are passed through as raw bytes, never re-encoded

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

const APPLICATION_JSON: &str = "application/json";

/// Outcome of a write, returned on `POST /proxies/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    pub message: String,
}

/// Error body for auth, lookup and storage failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// A complete HTTP response, emitted in one piece.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    content_type: Option<&'static str>,
    body: Bytes,
}

impl ApiResponse {
    /// Status only, no body.
    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            content_type: None,
            body: Bytes::new(),
        }
    }

    /// Serialize `value` as the JSON body.
    pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::raw_json(status, body),
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode response body");
                Self::empty(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// Bytes that are already JSON, sent verbatim.
    pub fn raw_json(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: Some(APPLICATION_JSON),
            body: body.into(),
        }
    }

    pub fn ack(status: StatusCode, success: bool, message: impl Into<String>) -> Self {
        Self::json(
            status,
            &Ack {
                success,
                message: message.into(),
            },
        )
    }

    pub fn error(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self::json(
            status,
            &ErrorBody {
                error: code.to_string(),
                message: message.into(),
            },
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        if let Some(content_type) = self.content_type {
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        response
    }
}
