//! Failure taxonomy for a single check request.
//!
//! Every failure a request can hit ends up as a [`RelayError`]; the HTTP layer
//! turns it into a response in exactly one place (`http::error::translate`).

use std::fmt;

use thiserror::Error;

use crate::session::SessionError;
use crate::upstream::UpstreamError;

/// Why a lookup came back empty. Both surface identically to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    /// The search returned nothing at all.
    NoCandidates,
    /// Found similar names but no exact match.
    NoExactMatch { candidates: usize },
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundReason::NoCandidates => write!(f, "search returned no users"),
            NotFoundReason::NoExactMatch { candidates } => write!(
                f,
                "found {} similar names but no exact match",
                candidates
            ),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("request rejected by admission filter")]
    AdmissionRejected,

    #[error("bad parameter: {0}")]
    BadParameter(String),

    #[error("user not found: {0}")]
    NotFound(NotFoundReason),

    #[error("VRChat session is not authenticated")]
    NotAuthenticated,

    #[error("VRChat rejected the request with {status}: {message}")]
    UpstreamClient { status: u16, message: String },

    #[error("VRChat rate limited the relay: {message}")]
    UpstreamRateLimited { status: u16, message: String },

    #[error("VRChat failed with {status}: {message}")]
    UpstreamServer { status: u16, message: String },

    #[error("network error talking to VRChat: {0}")]
    Network(String),

    #[error("unexpected failure: {0}")]
    Unknown(String),
}

impl From<UpstreamError> for RelayError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Network(msg) => RelayError::Network(msg),
            UpstreamError::RateLimited { message } => RelayError::UpstreamRateLimited {
                status: 429,
                message,
            },
            UpstreamError::Status { status: 429, message } => {
                RelayError::UpstreamRateLimited { status: 429, message }
            }
            UpstreamError::Status { status, message } if (400..500).contains(&status) => {
                RelayError::UpstreamClient { status, message }
            }
            UpstreamError::Status { status, message } if (500..600).contains(&status) => {
                RelayError::UpstreamServer { status, message }
            }
            UpstreamError::Status { status, message } => {
                RelayError::Unknown(format!("unexpected status {}: {}", status, message))
            }
            other @ (UpstreamError::Decode(_) | UpstreamError::Client(_)) => {
                RelayError::Unknown(other.to_string())
            }
        }
    }
}

impl From<SessionError> for RelayError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Upstream(e) => e.into(),
            _ => RelayError::NotAuthenticated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_classification() {
        let client: RelayError = UpstreamError::Status { status: 403, message: "nope".into() }.into();
        assert_eq!(client, RelayError::UpstreamClient { status: 403, message: "nope".into() });

        let server: RelayError = UpstreamError::Status { status: 503, message: "down".into() }.into();
        assert!(matches!(server, RelayError::UpstreamServer { status: 503, .. }));

        let limited: RelayError = UpstreamError::RateLimited { message: "slow".into() }.into();
        assert!(matches!(limited, RelayError::UpstreamRateLimited { status: 429, .. }));

        let odd: RelayError = UpstreamError::Status { status: 302, message: "moved".into() }.into();
        assert!(matches!(odd, RelayError::Unknown(_)));

        let decode: RelayError = UpstreamError::Decode("eof".into()).into();
        assert!(matches!(decode, RelayError::Unknown(_)));
    }

    #[test]
    fn test_session_errors_become_not_authenticated() {
        assert_eq!(RelayError::from(SessionError::NotAuthenticated), RelayError::NotAuthenticated);
        assert_eq!(
            RelayError::from(SessionError::Upstream(UpstreamError::Network("reset".into()))),
            RelayError::Network("reset".into())
        );
    }

    #[test]
    fn test_not_found_reasons_are_distinct_internally() {
        let none = RelayError::NotFound(NotFoundReason::NoCandidates).to_string();
        let similar = RelayError::NotFound(NotFoundReason::NoExactMatch { candidates: 3 }).to_string();
        assert_ne!(none, similar);
        assert!(similar.contains("no exact match"));
    }
}
