//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → owned by the Application, borrowed by subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; only the route table reloads at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{AppConfig, AppSection, LogFormat, ObservabilityConfig, RoutingConfig, ServerConfig};
pub use validation::{validate_config, ValidationError};
