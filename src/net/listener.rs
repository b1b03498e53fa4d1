//! Listener providers.
//!
//! # Responsibilities
//! - Define the "bind a listener for address A" capability
//! - Direct binding for standalone operation
//! - Conversion of a bound socket into a Tokio listener
//!
//! # Design Decisions
//! - Providers hand out `std` listeners so an upgrade mechanism can keep
//!   the raw socket for a successor process
//! - Bind failures are reported, never retried

use std::fmt;
use std::net::{SocketAddr, TcpListener as StdTcpListener, ToSocketAddrs};

use thiserror::Error;
use tokio::net::TcpListener;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The address could not be resolved.
    #[error("failed to resolve {addr}: {source}")]
    Resolve {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to bind to address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The bound socket could not be handed to the runtime.
    #[error("failed to register listener for {addr}: {source}")]
    Register {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// How the API listener was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenMode {
    /// Bound directly by this process.
    Direct,
    /// Obtained from the graceful-upgrade provider.
    Upgrade,
}

impl fmt::Display for ListenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenMode::Direct => write!(f, "direct"),
            ListenMode::Upgrade => write!(f, "upgrade"),
        }
    }
}

/// Capability to obtain a listening socket for an address.
pub trait ListenerProvider: Send + Sync {
    /// Return a listener bound to `addr`.
    fn listen(&self, addr: &str) -> Result<StdTcpListener, ListenerError>;

    fn mode(&self) -> ListenMode;
}

/// Binds a fresh socket on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectListener;

impl ListenerProvider for DirectListener {
    fn listen(&self, addr: &str) -> Result<StdTcpListener, ListenerError> {
        bind(addr)
    }

    fn mode(&self) -> ListenMode {
        ListenMode::Direct
    }
}

pub(crate) fn resolve(addr: &str) -> Result<Vec<SocketAddr>, ListenerError> {
    addr.to_socket_addrs()
        .map(|addrs| addrs.collect())
        .map_err(|source| ListenerError::Resolve {
            addr: addr.to_string(),
            source,
        })
}

pub(crate) fn bind(addr: &str) -> Result<StdTcpListener, ListenerError> {
    let addrs = resolve(addr)?;
    StdTcpListener::bind(addrs.as_slice()).map_err(|source| ListenerError::Bind {
        addr: addr.to_string(),
        source,
    })
}

/// Hand a bound socket to the Tokio runtime.
///
/// Must be called from within a runtime.
pub fn into_tokio(listener: StdTcpListener, addr: &str) -> Result<TcpListener, ListenerError> {
    let register = |source| ListenerError::Register {
        addr: addr.to_string(),
        source,
    };
    listener.set_nonblocking(true).map_err(register)?;
    TcpListener::from_std(listener).map_err(register)
}
