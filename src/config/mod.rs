//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)                 environment (.env / process)
//!     → loader.rs (parse)                → Credentials::from_env
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → shared by value/Arc with subsystems at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; allow-lists never change at runtime
//! - All fields have defaults to allow minimal configs
//! - Secrets never live in the config file

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_or_default, ConfigError};
pub use schema::{
    AdmissionConfig, CooldownConfig, Credentials, ListenerConfig, LogFormat, ObservabilityConfig,
    RelayConfig, SessionConfig, TimeoutConfig, TlsConfig, UpstreamConfig,
};
