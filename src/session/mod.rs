//! Session subsystem.
//!
//! # Data Flow
//! ```text
//! startup
//!     → store.rs (saved cookies, optional)
//!     → manager.rs initialize(): resume saved session, else password login (+ TOTP)
//!     → Ready: handle() hands out the shared client to resolver tasks
//! ```
//!
//! # Design Decisions
//! - Exactly one identity per process; constructed explicitly and injected
//! - Requests arriving before readiness fail fast with NotAuthenticated
//! - A stale saved session is handled like any other login failure

pub mod manager;
pub mod store;

pub use manager::{SessionError, SessionManager};
pub use store::SessionStore;
