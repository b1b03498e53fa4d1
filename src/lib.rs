//! Control plane for a file-configured reverse proxy.
//!
//! Serves an authenticated HTTP API over a directory holding one JSON file
//! per proxy configuration. The proxy engine watches that directory; this
//! crate only writes to it.

pub mod auth;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod store;

pub use auth::AuthConfig;
pub use config::ControlPlaneConfig;
pub use http::ApiServer;
pub use lifecycle::{ListenerBootstrap, Shutdown};
pub use store::{ConfigStore, ProxyConfig};
