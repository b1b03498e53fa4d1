//! Proxy configuration storage subsystem.
//!
//! # Data Flow
//! ```text
//! write(name, bytes)
//!     → proxy.rs (name rules, domainNames/proxyTo check)
//!     → files.rs (<name>.json.<uuid>.temp → fsync → rename → <name>.json)
//!
//! read(name) / list() / delete(name)
//!     → files.rs (direct filesystem access, no cache)
//! ```
//!
//! # Design Decisions
//! - The directory is the only state; nothing is cached in memory
//! - The routing engine watches the same directory, so a rename is the
//!   single externally visible mutation of a write

pub mod error;
pub mod files;
pub mod proxy;

pub use error::{StoreError, ValidationError};
pub use files::ConfigStore;
pub use proxy::ProxyConfig;
