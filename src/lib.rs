//! VRChat age-verification relay library.
//!
//! Answers "is this VRChat display name an age-verified adult?" for in-game
//! callers, using one shared authenticated VRChat session.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod resolver;
pub mod security;
pub mod session;
pub mod upstream;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use config::schema::RelayConfig;
pub use error::RelayError;
pub use http::RelayServer;
pub use lifecycle::Shutdown;
pub use session::SessionManager;
pub use upstream::{VrchatApi, VrchatClient};
