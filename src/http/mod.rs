//! HTTP surface of the relay.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (router, middleware stack, request ID)
//!     → security::admission (check route only)
//!     → handlers.rs (query parsing, resolver call, response shaping)
//!     → error.rs (every failure becomes one JSON error body)
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod request;
pub mod server;

pub use error::{translate, ErrorKind, ErrorResponse};
pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{build_router, AppState, RelayServer};
