//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Bootstrap asks for a listener on api.bind_address
//!     → listener.rs (DirectListener: bind now)
//!     → inherit.rs  (InheritedListeners: adopt from predecessor, else bind)
//!     → into_tokio (non-blocking, registered with the runtime)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - The upgrade mechanism is reached only through `ListenerProvider`
//! - No retry on bind failure

pub mod inherit;
pub mod listener;

pub use inherit::{InheritedListeners, LISTEN_FDS_ENV};
pub use listener::{into_tokio, DirectListener, ListenMode, ListenerError, ListenerProvider};
