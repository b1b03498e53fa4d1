//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     auth file {"bearerToken": ...}
//!     → secret.rs (load once, fatal if missing)
//!     → AuthConfig (immutable, shared via Arc)
//!
//! Per request:
//!     Authorization header
//!     → middleware.rs (extract header, short-circuit on failure)
//!     → gate.rs (no credential / malformed / invalid token / allow)
//! ```
//!
//! # Design Decisions
//! - One shared secret, no users or roles
//! - The check is stateless and identical for every protected route
//! - The secret is passed in explicitly, never read from global state

pub mod gate;
pub mod middleware;
pub mod secret;

pub use gate::{authorize, AuthError};
pub use middleware::require_bearer;
pub use secret::{AuthConfig, AuthConfigError};
