//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the config store
//! - Pick the listener provider once, from the upgrade toggle
//! - Bind the API listener and serve the router on it
//!
//! # Design Decisions
//! - Listener binds last (traffic only when the store is ready)
//! - A failed bind is terminal for the control plane only: it is logged
//!   and returned, never retried, and never takes down the host
//! - The auth secret is loaded by the caller and passed in

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::auth::AuthConfig;
use crate::config::ControlPlaneConfig;
use crate::http::ApiServer;
use crate::net::{into_tokio, DirectListener, InheritedListeners, ListenMode, ListenerError, ListenerProvider};
use crate::store::{ConfigStore, StoreError};

/// Error type for bringing the control plane up.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to open config store: {0}")]
    Store(#[from] StoreError),

    #[error("failed to start API listener: {0}")]
    Listener(#[from] ListenerError),

    #[error("failed to serve API: {0}")]
    Serve(#[from] std::io::Error),
}

/// Chooses how the API listener is obtained.
///
/// The provider is built once, so inherited sockets are adopted at most
/// once however many times `bind` is called.
pub struct ListenerBootstrap {
    upgrade_enabled: bool,
    provider: Arc<dyn ListenerProvider>,
}

impl ListenerBootstrap {
    /// `upgrade_enabled` is the host's graceful-upgrade toggle. In upgrade
    /// mode the provider adopts descriptors named in the environment.
    pub fn new(upgrade_enabled: bool) -> Self {
        let provider: Arc<dyn ListenerProvider> = if upgrade_enabled {
            Arc::new(InheritedListeners::from_env())
        } else {
            Arc::new(DirectListener)
        };
        Self {
            upgrade_enabled,
            provider,
        }
    }

    /// Use `provider` in upgrade mode instead of descriptor inheritance
    /// from the environment. Ignored in direct mode.
    pub fn with_upgrader(mut self, provider: Arc<dyn ListenerProvider>) -> Self {
        if self.upgrade_enabled {
            self.provider = provider;
        }
        self
    }

    /// The provider for this run.
    pub fn provider(&self) -> Arc<dyn ListenerProvider> {
        Arc::clone(&self.provider)
    }

    /// Obtain a runtime listener on `addr`.
    pub fn bind(&self, addr: &str) -> Result<(TcpListener, ListenMode), ListenerError> {
        let listener = self.provider.listen(addr)?;
        Ok((into_tokio(listener, addr)?, self.provider.mode()))
    }
}

/// A bound, ready-to-serve control plane.
pub struct ControlPlane {
    server: ApiServer,
    listener: TcpListener,
    mode: ListenMode,
}

impl ControlPlane {
    /// Open the store and bind the API listener.
    pub fn bind(
        config: &ControlPlaneConfig,
        auth: AuthConfig,
        bootstrap: &ListenerBootstrap,
    ) -> Result<Self, BootstrapError> {
        let store = ConfigStore::open(&config.api.proxies_dir)?;
        let server = ApiServer::new(store, auth, &config.api);
        let (listener, mode) = bootstrap.bind(&config.api.bind_address)?;

        tracing::info!(
            address = %config.api.bind_address,
            mode = %mode,
            proxies_dir = %config.api.proxies_dir.display(),
            "Control plane listener ready"
        );

        Ok(Self { server, listener, mode })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn mode(&self) -> ListenMode {
        self.mode
    }

    /// Serve until `shutdown` fires.
    pub async fn serve(self, shutdown: broadcast::Receiver<()>) -> Result<(), BootstrapError> {
        self.server.run(self.listener, shutdown).await?;
        Ok(())
    }
}

/// Bind and serve, logging any failure before returning it.
pub async fn run_control_plane(
    config: &ControlPlaneConfig,
    auth: AuthConfig,
    bootstrap: &ListenerBootstrap,
    shutdown: broadcast::Receiver<()>,
) -> Result<(), BootstrapError> {
    let result = match ControlPlane::bind(config, auth, bootstrap) {
        Ok(plane) => plane.serve(shutdown).await,
        Err(e) => Err(e),
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Control plane stopped");
    }
    result
}

/// Run the control plane as a background task of a host process.
///
/// Failures are logged and end only this task.
pub fn spawn_control_plane(
    config: ControlPlaneConfig,
    auth: AuthConfig,
    bootstrap: ListenerBootstrap,
    shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let _ = run_control_plane(&config, auth, &bootstrap, shutdown).await;
    })
}
