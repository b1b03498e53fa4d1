//! Proxy configuration records.
//!
//! Only the two fields the proxy engine cannot run without are checked.
//! Everything else in a payload is opaque and is persisted exactly as
//! submitted; this type is used for validation, never for re-encoding.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::error::{StoreError, ValidationError};

/// File extension of committed configurations.
pub const CONFIG_EXTENSION: &str = "json";

/// Suffix carried by in-flight temp files.
pub const TEMP_SUFFIX: &str = "temp";

/// Longest file name most filesystems accept.
const MAX_FILE_NAME_LEN: usize = 255;

/// Hex digits of the per-write temp file tag.
pub(crate) const TEMP_TAG_LEN: usize = uuid::fmt::Simple::LENGTH;

/// Longest accepted name. Leaves room for `.json` and for the temp
/// file's `.<tag>.temp` so every file the store creates stays within
/// [`MAX_FILE_NAME_LEN`].
pub const MAX_NAME_LEN: usize = MAX_FILE_NAME_LEN
    - (1 + CONFIG_EXTENSION.len())
    - (1 + TEMP_TAG_LEN + 1 + TEMP_SUFFIX.len());

/// A proxy configuration as consumed by the routing engine.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    /// Domains routed to `proxy_to`, in priority order.
    #[serde(default)]
    pub domain_names: Vec<String>,

    /// Upstream address, e.g. `10.0.0.5:25565`.
    #[serde(default)]
    pub proxy_to: String,

    /// Engine-specific fields passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProxyConfig {
    /// Parse and validate a raw payload.
    pub fn from_slice(raw: &[u8]) -> Result<Self, ValidationError> {
        if raw.is_empty() {
            return Err(ValidationError::EmptyBody);
        }

        let config: ProxyConfig = serde_json::from_slice(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the required fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.domain_names.is_empty() {
            return Err(ValidationError::MissingDomainNames);
        }
        if self.proxy_to.is_empty() {
            return Err(ValidationError::MissingProxyTo);
        }
        Ok(())
    }
}

/// Reject names that would escape the store directory or collide with
/// hidden and temp files.
pub fn validate_name(name: &str) -> Result<(), StoreError> {
    let invalid = name.is_empty()
        || name.len() > MAX_NAME_LEN
        || name.starts_with('.')
        || name
            .chars()
            .any(|c| c == '/' || c == '\\' || c == '\0' || c.is_control());

    if invalid {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Map a file name back to its configuration name.
///
/// Returns `None` for anything that is not a committed configuration file.
pub fn name_from_file(file_name: &str) -> Option<&str> {
    let name = file_name.strip_suffix(CONFIG_EXTENSION)?.strip_suffix('.')?;
    validate_name(name).ok()?;
    Some(name)
}
