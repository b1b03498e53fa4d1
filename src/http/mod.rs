//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (from net layer)
//!     → request.rs (x-request-id, per-request span)
//!     → server.rs (timeout, body limit, route match)
//!     → auth::middleware (bearer check, all routes but "/")
//!     → handlers.rs (ConfigStore call on the blocking pool)
//!     → response.rs (status + body built once)
//!     → Send to client
//! ```
//!
//! # Routes
//! | Method | Path              | Result                               |
//! |--------|-------------------|--------------------------------------|
//! | GET    | `/`               | 200, empty (no auth)                 |
//! | GET    | `/proxies`        | 200, JSON array of names             |
//! | GET    | `/proxies/{name}` | 200 stored bytes, 404 if absent      |
//! | POST   | `/proxies/{name}` | 200 ack, 400 on invalid payload      |
//! | DELETE | `/proxies/{name}` | 204, 404 if absent                   |

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, RequestSpan, X_REQUEST_ID};
pub use response::{Ack, ApiResponse, ErrorBody};
pub use server::{ApiServer, AppState};
