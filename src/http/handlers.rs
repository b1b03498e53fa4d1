//! Route handlers for the proxy configuration API.
//!
//! Each handler runs its store call on the blocking pool and maps the
//! result to a single [`ApiResponse`]. Storage errors never escape a
//! handler; I/O causes are logged here and, except on delete, replaced by
//! a generic message in the body.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};

use crate::http::response::ApiResponse;
use crate::http::server::AppState;
use crate::store::{ConfigStore, StoreError};

const ADDED: &str = "the proxy has been added successfully";

/// `GET /` liveness probe.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// `GET /proxies`
pub async fn list_proxies(State(state): State<AppState>) -> ApiResponse {
    match with_store(&state, |store| store.list()).await {
        Ok(names) => ApiResponse::json(StatusCode::OK, &names),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list proxy configs");
            ApiResponse::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "io",
                "failed to list proxy configurations",
            )
        }
    }
}

/// `GET /proxies/{name}`
pub async fn get_proxy(State(state): State<AppState>, Path(name): Path<String>) -> ApiResponse {
    let lookup = name.clone();
    match with_store(&state, move |store| store.read(&lookup)).await {
        Ok(raw) => ApiResponse::raw_json(StatusCode::OK, raw),
        Err(e) => lookup_error(&name, e),
    }
}

/// `POST /proxies/{name}`
pub async fn put_proxy(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> ApiResponse {
    if body.is_empty() {
        return ApiResponse::ack(StatusCode::BAD_REQUEST, false, "request body is empty");
    }

    let target = name.clone();
    match with_store(&state, move |store| store.write(&target, &body)).await {
        Ok(()) => {
            tracing::info!(name = %name, "Proxy config stored");
            ApiResponse::ack(StatusCode::OK, true, ADDED)
        }
        Err(StoreError::Validation(e)) => {
            tracing::debug!(name = %name, error = %e, "Rejected proxy config");
            ApiResponse::ack(StatusCode::BAD_REQUEST, false, e.to_string())
        }
        Err(e @ StoreError::InvalidName(_)) => {
            ApiResponse::ack(StatusCode::BAD_REQUEST, false, e.to_string())
        }
        Err(e) => {
            tracing::error!(name = %name, error = %e, "Failed to store proxy config");
            ApiResponse::ack(
                StatusCode::INTERNAL_SERVER_ERROR,
                false,
                "failed to store proxy configuration",
            )
        }
    }
}

/// `DELETE /proxies/{name}`
///
/// 204 on success. Failures carry the underlying error text.
pub async fn delete_proxy(State(state): State<AppState>, Path(name): Path<String>) -> ApiResponse {
    let target = name.clone();
    match with_store(&state, move |store| store.delete(&target)).await {
        Ok(()) => {
            tracing::info!(name = %name, "Proxy config deleted");
            ApiResponse::empty(StatusCode::NO_CONTENT)
        }
        Err(e) => {
            let status = match &e {
                StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                StoreError::InvalidName(_) | StoreError::Validation(_) => StatusCode::BAD_REQUEST,
                StoreError::Io { .. } => {
                    tracing::error!(name = %name, error = %e, "Failed to delete proxy config");
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            ApiResponse::error(status, error_code(&e), e.to_string())
        }
    }
}

fn lookup_error(name: &str, e: StoreError) -> ApiResponse {
    match e {
        StoreError::NotFound(_) => ApiResponse::error(StatusCode::NOT_FOUND, "not_found", e.to_string()),
        StoreError::InvalidName(_) => ApiResponse::error(StatusCode::BAD_REQUEST, "invalid_name", e.to_string()),
        e => {
            tracing::error!(name = %name, error = %e, "Failed to read proxy config");
            ApiResponse::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "io",
                "failed to read proxy configuration",
            )
        }
    }
}

fn error_code(e: &StoreError) -> &'static str {
    match e {
        StoreError::InvalidName(_) => "invalid_name",
        StoreError::NotFound(_) => "not_found",
        StoreError::Validation(_) => "invalid_config",
        StoreError::Io { .. } => "io",
    }
}

/// Run a store operation without stalling the async workers.
async fn with_store<T, F>(state: &AppState, op: F) -> Result<T, StoreError>
where
    F: FnOnce(&ConfigStore) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || op(&store))
        .await
        .map_err(|e| StoreError::io("store task failed", std::io::Error::other(e)))?
}
