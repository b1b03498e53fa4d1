//! Upgrade-aware listener provider.
//!
//! During a graceful upgrade the outgoing process keeps its listening
//! sockets open across `exec` and names them in `CONTROL_PLANE_LISTEN_FDS`
//! (comma-separated descriptor numbers). The incoming process adopts the
//! socket whose local address matches the one it wants, so connections
//! queued on it are never refused. Addresses with no inherited socket are
//! bound fresh.
//!
//! Descriptors are adopted at most once per process. Later calls find the
//! environment already consumed and bind fresh, so no descriptor ever gets
//! two owners.
//!
//! Every listener handed out is remembered so the host's upgrade mechanism
//! can pass the same set on to the next generation via [`export_env`].
//! Clearing close-on-exec on those descriptors before spawning the
//! successor is the host's job.
//!
//! [`export_env`]: InheritedListeners::export_env

use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::net::listener::{bind, resolve, ListenMode, ListenerError, ListenerProvider};

/// Environment variable naming inherited listener descriptors.
pub const LISTEN_FDS_ENV: &str = "CONTROL_PLANE_LISTEN_FDS";

/// Set once the inherited descriptors have been taken.
static FDS_ADOPTED: AtomicBool = AtomicBool::new(false);

#[derive(Default)]
struct Registry {
    /// Inherited sockets not yet claimed.
    inherited: Vec<(SocketAddr, StdTcpListener)>,
    /// Sockets handed out, kept for the next generation.
    active: Vec<(SocketAddr, StdTcpListener)>,
}

/// Listener provider that participates in live process replacement.
#[derive(Default)]
pub struct InheritedListeners {
    registry: Mutex<Registry>,
}

impl InheritedListeners {
    /// Adopt listeners already owned by the host process.
    pub fn from_listeners(listeners: Vec<StdTcpListener>) -> Self {
        let inherited = listeners
            .into_iter()
            .filter_map(|listener| match listener.local_addr() {
                Ok(addr) => Some((addr, listener)),
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping inherited listener without local address");
                    None
                }
            })
            .collect();

        Self {
            registry: Mutex::new(Registry {
                inherited,
                active: Vec::new(),
            }),
        }
    }

    /// Adopt the descriptors named in [`LISTEN_FDS_ENV`].
    ///
    /// Unset or empty means a cold start with nothing to inherit.
    pub(crate) fn from_env() -> Self {
        match std::env::var(LISTEN_FDS_ENV) {
            Ok(value) if !value.trim().is_empty() => Self::adopt_once(&value),
            _ => Self::default(),
        }
    }

    /// Take ownership of the descriptors in `value` unless this process
    /// already did.
    fn adopt_once(value: &str) -> Self {
        if FDS_ADOPTED.swap(true, Ordering::SeqCst) {
            tracing::warn!(env = LISTEN_FDS_ENV, "Inherited listeners already adopted, binding fresh");
            return Self::default();
        }

        // SAFETY: the predecessor hands these descriptors to this process
        // exclusively, and FDS_ADOPTED guarantees they are wrapped once.
        let listeners = unsafe { adopt_fds(&parse_fds(value)) };
        tracing::info!(count = listeners.len(), "Inherited listeners from previous process");
        Self::from_listeners(listeners)
    }

    /// Number of inherited sockets not yet claimed.
    pub fn unclaimed(&self) -> usize {
        self.registry
            .lock()
            .map(|registry| registry.inherited.len())
            .unwrap_or(0)
    }

    /// Value of [`LISTEN_FDS_ENV`] for a successor process.
    #[cfg(unix)]
    pub fn export_env(&self) -> String {
        use std::os::unix::io::AsRawFd;

        let Ok(registry) = self.registry.lock() else {
            return String::new();
        };
        registry
            .active
            .iter()
            .map(|(_, listener)| listener.as_raw_fd().to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl ListenerProvider for InheritedListeners {
    fn listen(&self, addr: &str) -> Result<StdTcpListener, ListenerError> {
        let wanted = resolve(addr)?;
        let mut registry = self.registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let position = registry
            .inherited
            .iter()
            .position(|(local, _)| wanted.contains(local));

        let (local, listener) = match position {
            Some(index) => {
                let (local, listener) = registry.inherited.swap_remove(index);
                tracing::info!(address = %local, "Adopted inherited listener");
                (local, listener)
            }
            None => {
                let listener = bind(addr)?;
                let local = listener.local_addr().map_err(|source| ListenerError::Bind {
                    addr: addr.to_string(),
                    source,
                })?;
                tracing::info!(address = %local, "No inherited listener, bound fresh");
                (local, listener)
            }
        };

        let handle = listener.try_clone().map_err(|source| ListenerError::Register {
            addr: addr.to_string(),
            source,
        })?;
        registry.active.push((local, handle));

        Ok(listener)
    }

    fn mode(&self) -> ListenMode {
        ListenMode::Upgrade
    }
}

/// Parse `3,4,5`, skipping junk, stdio and duplicates.
fn parse_fds(value: &str) -> Vec<i32> {
    let mut fds = Vec::new();
    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<i32>() {
            Ok(fd) if fd > 2 && !fds.contains(&fd) => fds.push(fd),
            _ => tracing::warn!(entry = %part, env = LISTEN_FDS_ENV, "Ignoring invalid descriptor"),
        }
    }
    fds
}

/// Wrap each descriptor in an owning listener.
///
/// # Safety
///
/// Every descriptor must be an open listening socket owned by nobody else
/// in this process, and the slice must hold no duplicates.
#[cfg(unix)]
unsafe fn adopt_fds(fds: &[i32]) -> Vec<StdTcpListener> {
    use std::os::unix::io::FromRawFd;

    fds.iter()
        // SAFETY: upheld by the caller.
        .map(|&fd| unsafe { StdTcpListener::from_raw_fd(fd) })
        .collect()
}

#[cfg(not(unix))]
unsafe fn adopt_fds(fds: &[i32]) -> Vec<StdTcpListener> {
    if !fds.is_empty() {
        tracing::warn!("Listener inheritance is only supported on Unix");
    }
    Vec::new()
}
