//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;

use tempfile::TempDir;

use control_plane::config::ControlPlaneConfig;
use control_plane::lifecycle::{ControlPlane, ListenerBootstrap, Shutdown};
use control_plane::AuthConfig;

pub const TOKEN: &str = "secret123";

/// A control plane running on a loopback port over a scratch directory.
pub struct TestPlane {
    pub addr: SocketAddr,
    pub dir: TempDir,
    pub shutdown: Shutdown,
    pub client: reqwest::Client,
}

impl TestPlane {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn proxies_dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(TOKEN)
    }

    pub fn post(&self, path: &str, body: impl Into<reqwest::Body>) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(TOKEN).body(body)
    }

    pub fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(TOKEN)
    }
}

impl Drop for TestPlane {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a control plane in direct mode on an ephemeral port.
pub async fn start_plane() -> TestPlane {
    start_plane_with(ListenerBootstrap::new(false), "127.0.0.1:0").await
}

/// Start a control plane with an explicit bootstrap and bind address.
pub async fn start_plane_with(bootstrap: ListenerBootstrap, bind_address: &str) -> TestPlane {
    let dir = TempDir::new().expect("should create temp dir");

    let mut config = ControlPlaneConfig::default();
    config.api.bind_address = bind_address.to_string();
    config.api.proxies_dir = dir.path().to_path_buf();

    let auth = AuthConfig::new(TOKEN).unwrap();
    let plane = ControlPlane::bind(&config, auth, &bootstrap).expect("control plane should bind");
    let addr = plane.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = plane.serve(server_shutdown).await;
    });

    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    TestPlane {
        addr,
        dir,
        shutdown,
        client,
    }
}
