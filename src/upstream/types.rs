//! VRChat API payloads and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A lightweight search hit returned by `GET /users`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateUser {
    pub id: String,
    pub display_name: String,
}

/// Full profile returned by `GET /users/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    /// `"18+"` for verified adults, `"hidden"` when undisclosed.
    #[serde(default)]
    pub age_verification_status: Option<String>,
}

/// The account this relay is logged in as (`GET /auth/user`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: String,
    pub display_name: String,
}

/// Result of an authentication attempt against `GET /auth/user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Fully logged in.
    Authenticated(CurrentUser),
    /// Password accepted, second factor still required. Holds the offered
    /// methods (`totp`, `otp`, `emailOtp`).
    TwoFactorRequired(Vec<String>),
}

/// Session cookies VRChat issues after login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthCookies {
    pub auth: Option<String>,
    pub two_factor_auth: Option<String>,
}

impl AuthCookies {
    pub fn is_empty(&self) -> bool {
        self.auth.is_none() && self.two_factor_auth.is_none()
    }

    /// Render as a `Cookie` request header value.
    pub fn header_value(&self) -> Option<String> {
        let pairs: Vec<String> = [("auth", &self.auth), ("twoFactorAuth", &self.two_factor_auth)]
            .into_iter()
            .filter_map(|(name, value)| value.as_ref().map(|v| format!("{}={}", name, v)))
            .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }

    /// Absorb one `Set-Cookie` header. Unrelated cookies are ignored and an
    /// empty value (VRChat's way of clearing a cookie) removes the entry.
    pub fn absorb_set_cookie(&mut self, set_cookie: &str) {
        let pair = set_cookie.split(';').next().unwrap_or_default();
        let Some((name, value)) = pair.split_once('=') else {
            return;
        };

        let slot = match name.trim() {
            "auth" => &mut self.auth,
            "twoFactorAuth" => &mut self.two_factor_auth,
            _ => return,
        };

        let value = value.trim();
        *slot = if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        };
    }
}

/// Errors that can occur while talking to VRChat.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    /// Connection failure or timeout before a response arrived.
    #[error("network error: {0}")]
    Network(String),

    /// VRChat answered 429.
    #[error("rate limited by VRChat: {message}")]
    RateLimited { message: String },

    /// VRChat answered with a non-success status.
    #[error("VRChat returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// The HTTP client itself could not be built.
    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

impl UpstreamError {
    /// Classify a non-success status code.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == 429 {
            Self::RateLimited { message }
        } else {
            Self::Status { status, message }
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_builder() {
            Self::Client(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Result type for VRChat operations.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Pull the human-readable message out of VRChat's error envelope
/// (`{"error":{"message":"\"...\"","status_code":401}}`).
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let message = value.get("error")?.get("message")?.as_str()?;
    let message = message.trim().trim_matches('"').trim();
    (!message.is_empty()).then(|| message.to_string())
}
