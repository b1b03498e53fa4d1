//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ControlPlaneConfig → Result<(), Vec<ValidationError>>
//! - Runs before the auth file is read or a listener is bound

use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;

use crate::config::schema::ControlPlaneConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("api.bind_address {0:?} is not of the form host:port")]
    BindAddress(String),

    #[error("api.proxies_dir must not be empty")]
    ProxiesDir,

    #[error("api.auth_file must not be empty")]
    AuthFile,

    #[error("api.request_timeout_secs must be greater than zero")]
    RequestTimeout,

    #[error("api.max_body_size must be greater than zero")]
    MaxBodySize,

    #[error("observability.log_level {0:?} is not a known level")]
    LogLevel(String),
}

/// Check every field, collecting all problems.
pub fn validate_config(config: &ControlPlaneConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let api = &config.api;

    if !is_host_port(&api.bind_address) {
        errors.push(ValidationError::BindAddress(api.bind_address.clone()));
    }
    if api.proxies_dir.as_os_str().is_empty() {
        errors.push(ValidationError::ProxiesDir);
    }
    if api.auth_file.as_os_str().is_empty() {
        errors.push(ValidationError::AuthFile);
    }
    if api.request_timeout_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }
    if api.max_body_size == 0 {
        errors.push(ValidationError::MaxBodySize);
    }
    if LevelFilter::from_str(&config.observability.log_level).is_err() {
        errors.push(ValidationError::LogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `host:port` or `[v6]:port` with a non-empty host. Hostnames are not
/// resolved here.
fn is_host_port(addr: &str) -> bool {
    let Some((host, port)) = addr.rsplit_once(':') else {
        return false;
    };
    let host_ok = if let Some(inner) = host.strip_prefix('[') {
        inner.ends_with(']')
    } else {
        !host.is_empty() && !host.contains(':')
    };
    host_ok && port.parse::<u16>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&ControlPlaneConfig::default()), Ok(()));
    }

    #[test]
    fn bind_address_forms() {
        for ok in ["127.0.0.1:8080", "0.0.0.0:0", "localhost:9000", "[::1]:8080"] {
            assert!(is_host_port(ok), "{ok}");
        }
        for bad in ["8080", "127.0.0.1", "127.0.0.1:http", "::1:8080", "host:70000", ":8080", ""] {
            assert!(!is_host_port(bad), "{bad}");
        }
    }

    #[test]
    fn collects_all_errors() {
        let mut config = ControlPlaneConfig::default();
        config.api.bind_address = "nowhere".into();
        config.api.request_timeout_secs = 0;
        config.api.max_body_size = 0;
        config.observability.log_level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::BindAddress("nowhere".into()),
                ValidationError::RequestTimeout,
                ValidationError::MaxBodySize,
                ValidationError::LogLevel("loud".into()),
            ]
        );
    }

    #[test]
    fn empty_paths_are_rejected() {
        let mut config = ControlPlaneConfig::default();
        config.api.proxies_dir = "".into();
        config.api.auth_file = "".into();
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::ProxiesDir, ValidationError::AuthFile]
        );
    }
}
