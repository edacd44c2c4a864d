//! VRChat integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (username, password, TOTP secret)
//!     → session manager (login handshake)
//!     → client.rs (cookie-carrying REST calls with timeouts)
//!     → types.rs (payloads, UpstreamError)
//! ```
//!
//! # Security Constraints
//! - Credentials ONLY from environment variables
//! - Never log passwords, TOTP codes, or auth cookies
//! - Every call is bounded by the HTTP client's timeout

pub mod client;
pub mod totp;
pub mod types;

use async_trait::async_trait;

pub use client::VrchatClient;
pub use totp::{Totp, TotpError};
pub use types::{
    AuthCookies, CandidateUser, CurrentUser, LoginOutcome, UpstreamError, UpstreamResult,
    UserProfile,
};

/// The slice of the VRChat API this relay depends on.
///
/// Implemented by [`VrchatClient`] in production and by in-memory fakes in tests.
#[async_trait]
pub trait VrchatApi: Send + Sync {
    /// Password login. May end in a second-factor challenge.
    async fn login(&self, username: &str, password: &str) -> UpstreamResult<LoginOutcome>;

    /// Check the session carried by the current cookies.
    async fn current_user(&self) -> UpstreamResult<LoginOutcome>;

    /// Submit an authenticator code. `Ok(false)` means the code was rejected.
    async fn verify_totp(&self, code: &str) -> UpstreamResult<bool>;

    /// Non-fuzzy user search, in VRChat's ranking order.
    async fn search_users(&self, query: &str, limit: u32) -> UpstreamResult<Vec<CandidateUser>>;

    /// Full profile by user id.
    async fn get_user(&self, id: &str) -> UpstreamResult<UserProfile>;

    /// Snapshot of the current session cookies.
    fn auth_cookies(&self) -> AuthCookies;

    /// Replace the session cookies (e.g. from a saved session).
    fn restore_auth_cookies(&self, cookies: AuthCookies);
}
