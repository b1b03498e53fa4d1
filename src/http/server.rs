//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router for the proxy configuration API
//! - Put the bearer check in front of every route except `/`
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Serve on a listener handed over by the bootstrap
//! - Drain in-flight requests on shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::{require_bearer, AuthConfig};
use crate::config::ApiConfig;
use crate::http::handlers::{delete_proxy, get_proxy, list_proxies, liveness, put_proxy};
use crate::http::request::{MakeRequestUuid, RequestSpan, X_REQUEST_ID};
use crate::store::ConfigStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ConfigStore>,
    pub auth: Arc<AuthConfig>,
}

/// HTTP server for the control plane.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Create a server over `store`, guarded by `auth`.
    pub fn new(store: ConfigStore, auth: AuthConfig, config: &ApiConfig) -> Self {
        let state = AppState {
            store: Arc::new(store),
            auth: Arc::new(auth),
        };
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ApiConfig, state: AppState) -> Router {
        let protected = Router::new()
            .route("/proxies", get(list_proxies))
            .route(
                "/proxies/{name}",
                get(get_proxy).post(put_proxy).delete(delete_proxy),
            )
            .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

        Router::new()
            .route("/", get(liveness))
            .merge(protected)
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(RequestSpan))
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                    .layer(RequestBodyLimitLayer::new(config.max_body_size))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs))),
            )
    }

    /// The assembled router, for driving the API without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Control plane API serving");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Control plane API draining");
            })
            .await?;

        tracing::info!("Control plane API stopped");
        Ok(())
    }
}
