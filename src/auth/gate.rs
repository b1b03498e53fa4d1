//! Bearer credential check.

use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::auth::secret::AuthConfig;

/// Reason a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("No authorization header provided")]
    NoCredential,

    #[error("Invalid authorization header format")]
    Malformed,

    #[error("Invalid token")]
    InvalidToken,
}

impl AuthError {
    /// Stable machine-readable code for response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::NoCredential => "no_credential",
            AuthError::Malformed => "malformed",
            AuthError::InvalidToken => "invalid_token",
        }
    }
}

/// Decide whether an `Authorization` header value grants access.
///
/// The header must be exactly `Bearer <token>`: two space-separated
/// parts, the first literally `Bearer`.
pub fn authorize(header: Option<&[u8]>, auth: &AuthConfig) -> Result<(), AuthError> {
    let header = header.ok_or(AuthError::NoCredential)?;
    let header = std::str::from_utf8(header).map_err(|_| AuthError::Malformed)?;

    let parts: Vec<&str> = header.split(' ').collect();
    let token = match parts.as_slice() {
        ["Bearer", token] => *token,
        _ => return Err(AuthError::Malformed),
    };

    if bool::from(token.as_bytes().ct_eq(auth.bearer_token().as_bytes())) {
        Ok(())
    } else {
        Err(AuthError::InvalidToken)
    }
}
