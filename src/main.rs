//! Proxy configuration control plane.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────┐
//!                          │                CONTROL PLANE                  │
//!                          │                                               │
//!     Operator Request     │  ┌─────────┐   ┌─────────┐   ┌────────────┐  │
//!     ─────────────────────┼─▶│   net   │──▶│  http   │──▶│    auth    │  │
//!                          │  │listener │   │ router  │   │   gate     │  │
//!                          │  └─────────┘   └─────────┘   └─────┬──────┘  │
//!                          │       ▲                             │         │
//!                          │       │ direct | upgrade            ▼         │
//!                          │  ┌─────────┐                 ┌────────────┐   │
//!                          │  │lifecycle│                 │   store    │   │
//!                          │  │bootstrap│                 │ temp+rename│   │
//!                          │  └─────────┘                 └─────┬──────┘   │
//!                          └────────────────────────────────────┼──────────┘
//!                                                               ▼
//!                                                   proxies/<name>.json
//!                                                   (read by the proxy engine)
//! ```

use std::path::PathBuf;

use clap::Parser;

use control_plane::auth::AuthConfig;
use control_plane::config::{read_config, validation::validate_config, ConfigError, ControlPlaneConfig};
use control_plane::lifecycle::{run_control_plane, spawn_signal_listener, ListenerBootstrap, Shutdown};
use control_plane::observability::init_logging;

#[derive(Parser)]
#[command(name = "control-plane")]
#[command(about = "Authenticated HTTP API over a directory of proxy configurations", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "CONTROL_PLANE_CONFIG")]
    config: Option<PathBuf>,

    /// Override api.bind_address.
    #[arg(long)]
    bind: Option<String>,

    /// Override api.proxies_dir.
    #[arg(long)]
    proxies_dir: Option<PathBuf>,

    /// Override api.auth_file.
    #[arg(long)]
    auth_file: Option<PathBuf>,

    /// Obtain the listener from the graceful-upgrade provider.
    #[arg(long)]
    upgrade: bool,
}

impl Args {
    fn apply(&self, config: &mut ControlPlaneConfig) {
        if let Some(bind) = &self.bind {
            config.api.bind_address = bind.clone();
        }
        if let Some(dir) = &self.proxies_dir {
            config.api.proxies_dir = dir.clone();
        }
        if let Some(file) = &self.auth_file {
            config.api.auth_file = file.clone();
        }
        if self.upgrade {
            config.upgrade.enabled = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => ControlPlaneConfig::default(),
    };
    args.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.api.bind_address,
        upgrade = config.upgrade.enabled,
        "Configuration loaded"
    );

    let auth = match AuthConfig::load(&config.api.auth_file) {
        Ok(auth) => auth,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load API auth file");
            return Err(e.into());
        }
    };

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    let bootstrap = ListenerBootstrap::new(config.upgrade.enabled);
    run_control_plane(&config, auth, &bootstrap, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
