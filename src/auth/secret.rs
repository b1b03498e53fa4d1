//! Bearer secret loading.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Error type for loading the auth file.
#[derive(Debug, Error)]
pub enum AuthConfigError {
    #[error("failed to read auth file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse auth file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("bearer token not found in auth file {0}")]
    MissingToken(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthFile {
    #[serde(default)]
    bearer_token: Option<String>,
}

/// The shared secret guarding every protected route.
///
/// Loaded once before the listener is bound and never mutated afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthConfig {
    bearer_token: String,
}

impl AuthConfig {
    /// Build from an in-memory token. An empty token is refused.
    pub fn new(bearer_token: impl Into<String>) -> Result<Self, AuthConfigError> {
        let bearer_token = bearer_token.into();
        if bearer_token.is_empty() {
            return Err(AuthConfigError::MissingToken("<inline>".to_string()));
        }
        Ok(Self { bearer_token })
    }

    /// Load `{"bearerToken": "<secret>"}` from `path`.
    pub fn load(path: &Path) -> Result<Self, AuthConfigError> {
        let display = path.display().to_string();
        let content = fs::read(path).map_err(|source| AuthConfigError::Io {
            path: display.clone(),
            source,
        })?;

        let file: AuthFile = serde_json::from_slice(&content).map_err(|source| AuthConfigError::Parse {
            path: display.clone(),
            source,
        })?;

        match file.bearer_token {
            Some(token) if !token.is_empty() => Ok(Self { bearer_token: token }),
            _ => Err(AuthConfigError::MissingToken(display)),
        }
    }

    pub fn bearer_token(&self) -> &str {
        &self.bearer_token
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("bearer_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_auth(content: &str) -> (TempDir, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("api.json");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_token() {
        let (_dir, path) = write_auth(r#"{"bearerToken":"secret123"}"#);
        let auth = AuthConfig::load(&path).unwrap();
        assert_eq!(auth.bearer_token(), "secret123");
    }

    #[test]
    fn ignores_extra_fields() {
        let (_dir, path) = write_auth(r#"{"bearerToken":"s","bind":":8080"}"#);
        assert_eq!(AuthConfig::load(&path).unwrap().bearer_token(), "s");
    }

    #[test]
    fn missing_or_empty_token_is_fatal() {
        let (_dir, path) = write_auth("{}");
        assert!(matches!(AuthConfig::load(&path), Err(AuthConfigError::MissingToken(_))));

        let (_dir, path) = write_auth(r#"{"bearerToken":""}"#);
        assert!(matches!(AuthConfig::load(&path), Err(AuthConfigError::MissingToken(_))));
    }

    #[test]
    fn unreadable_and_malformed_files() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            AuthConfig::load(&dir.path().join("absent.json")),
            Err(AuthConfigError::Io { .. })
        ));

        let (_dir, path) = write_auth("bearerToken = 1");
        assert!(matches!(AuthConfig::load(&path), Err(AuthConfigError::Parse { .. })));
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let auth = AuthConfig::new("hunter2").unwrap();
        assert!(!format!("{auth:?}").contains("hunter2"));
        assert!(AuthConfig::new("").is_err());
    }
}
