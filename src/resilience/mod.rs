//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Check request, after admission and session checks:
//!     → cooldown.rs (reserve a slot, sleep until it)
//!     → VRChat search + profile fetch
//! ```
//!
//! # Design Decisions
//! - Protects the single upstream account from lockout, not the relay itself
//! - No automatic retries: a failed or rate-limited call surfaces immediately
//! - Every external call has a deadline (HTTP client timeout)

pub mod cooldown;

pub use cooldown::CooldownGate;
