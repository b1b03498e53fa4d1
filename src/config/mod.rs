//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! control-plane.toml
//!     → loader.rs (parse & deserialize)
//!     → command-line overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → ControlPlaneConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - The bearer secret lives in its own JSON file, see `auth::secret`

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, read_config, ConfigError};
pub use schema::{ApiConfig, ControlPlaneConfig, LogFormat, ObservabilityConfig, UpgradeConfig};
