//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming /checkAdultStatus request:
//!     → admission.rs (user agent, runtime version, caller tag)
//!     → Pass to handler
//! /health bypasses this layer entirely.
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any check failure
//! - Rejections are indistinguishable from unknown routes
//! - No trust in client input

pub mod admission;

pub use admission::{admission_middleware, AdmissionFilter, Rejection};
