//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → owned by LocalServer, copied into each running listener
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the server is built; restart to change it
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ensure_valid, load_config, ConfigError};
pub use schema::{BridgeConfig, LimitsConfig, ListenerConfig, ObservabilityConfig, ServerConfig};
