//! Listener bootstrap tests: direct and upgrade modes, bind failures.

use std::net::TcpListener as StdTcpListener;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;

use control_plane::config::ControlPlaneConfig;
use control_plane::lifecycle::{spawn_control_plane, BootstrapError, ControlPlane, ListenerBootstrap, Shutdown};
use control_plane::net::{InheritedListeners, ListenMode, ListenerError};
use control_plane::AuthConfig;

mod common;

#[tokio::test]
async fn test_direct_mode_serves() {
    let plane = common::start_plane().await;
    let res = plane.get("/proxies").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_upgrade_mode_adopts_inherited_listener() {
    let inherited = StdTcpListener::bind("127.0.0.1:0").unwrap();
    let addr = inherited.local_addr().unwrap();
    let provider = Arc::new(InheritedListeners::from_listeners(vec![inherited]));
    let bootstrap = ListenerBootstrap::new(true).with_upgrader(provider.clone());

    let plane = common::start_plane_with(bootstrap, &addr.to_string()).await;
    assert_eq!(plane.addr, addr);
    assert_eq!(provider.unclaimed(), 0);

    let res = plane.get("/proxies").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_bind_failure_is_reported_not_fatal() {
    let held = StdTcpListener::bind("127.0.0.1:0").unwrap();
    let dir = tempfile::TempDir::new().unwrap();

    let mut config = ControlPlaneConfig::default();
    config.api.bind_address = held.local_addr().unwrap().to_string();
    config.api.proxies_dir = dir.path().to_path_buf();

    let auth = AuthConfig::new(common::TOKEN).unwrap();
    let result = ControlPlane::bind(&config, auth.clone(), &ListenerBootstrap::new(false));
    assert!(matches!(
        result,
        Err(BootstrapError::Listener(ListenerError::Bind { .. }))
    ));

    // The spawned service ends on its own; the host keeps running.
    let shutdown = Shutdown::new();
    let handle = spawn_control_plane(config, auth, ListenerBootstrap::new(false), shutdown.subscribe());
    let joined = tokio::time::timeout(Duration::from_secs(5), handle).await;
    assert!(matches!(joined, Ok(Ok(()))));
}

#[tokio::test]
async fn test_graceful_shutdown_stops_serving() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut config = ControlPlaneConfig::default();
    config.api.bind_address = "127.0.0.1:0".to_string();
    config.api.proxies_dir = dir.path().to_path_buf();

    let plane = ControlPlane::bind(
        &config,
        AuthConfig::new(common::TOKEN).unwrap(),
        &ListenerBootstrap::new(false),
    )
    .unwrap();
    assert_eq!(plane.mode(), ListenMode::Direct);

    let shutdown = Shutdown::new();
    let serving = tokio::spawn(plane.serve(shutdown.subscribe()));

    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), serving).await;
    assert!(matches!(result, Ok(Ok(Ok(())))));
}
