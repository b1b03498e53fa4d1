//! Configuration schema definitions.
//!
//! This module defines the configuration structure for the control plane.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the control plane.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ControlPlaneConfig {
    /// HTTP API settings.
    pub api: ApiConfig,

    /// Graceful upgrade integration.
    pub upgrade: UpgradeConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Directory holding one `<name>.json` per proxy.
    pub proxies_dir: PathBuf,

    /// JSON file holding `{"bearerToken": "..."}`.
    pub auth_file: PathBuf,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            proxies_dir: PathBuf::from("./proxies"),
            auth_file: PathBuf::from("./api.json"),
            request_timeout_secs: 30,
            max_body_size: 1024 * 1024,
        }
    }
}

/// Graceful upgrade configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct UpgradeConfig {
    /// Obtain the API listener from the upgrade-aware provider instead of
    /// binding it directly.
    pub enabled: bool,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
