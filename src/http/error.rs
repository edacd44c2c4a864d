//! Error translation: the single place a [`RelayError`] becomes an HTTP response.
//!
//! | Failure              | Status       |
//! |----------------------|--------------|
//! | not-found            | 404          |
//! | not-authenticated    | 401          |
//! | bad-parameter        | 400          |
//! | upstream 429         | 429          |
//! | upstream other 4xx   | same code    |
//! | upstream 5xx         | 502          |
//! | network / timeout    | 503          |
//! | anything else        | 500          |
//!
//! Admission rejections reuse the exact unknown-route body so probing cannot
//! tell which check failed.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::RelayError;

pub const NOT_FOUND_MESSAGE: &str = "Not found";
pub const USER_NOT_FOUND_MESSAGE: &str = "User not found";

/// Machine-readable failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AdmissionRejected,
    BadParameter,
    NotFound,
    NotAuthenticated,
    UpstreamClientError,
    UpstreamRateLimited,
    UpstreamServerError,
    NetworkError,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::AdmissionRejected => "admission_rejected",
            ErrorKind::BadParameter => "bad_parameter",
            ErrorKind::NotFound => "not_found",
            ErrorKind::NotAuthenticated => "not_authenticated",
            ErrorKind::UpstreamClientError => "upstream_client_error",
            ErrorKind::UpstreamRateLimited => "upstream_rate_limited",
            ErrorKind::UpstreamServerError => "upstream_server_error",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::Unknown => "unknown",
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(rename = "errorType", skip_serializing_if = "Option::is_none")]
    pub error_type: Option<&'static str>,
    #[serde(rename = "statusCode", skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

/// The {status, message, kind} triple plus its rendered body.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    pub status: StatusCode,
    pub kind: ErrorKind,
    pub body: ErrorBody,
}

impl ErrorResponse {
    fn new(status: StatusCode, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            body: ErrorBody {
                error: message.into(),
                error_type: None,
                status_code: None,
            },
        }
    }

    fn typed(mut self) -> Self {
        self.body.error_type = Some(self.kind.as_str());
        self
    }

    fn with_upstream_status(mut self, status: u16) -> Self {
        self.body.status_code = Some(status);
        self
    }

    pub fn message(&self) -> &str {
        &self.body.error
    }
}

/// Map a failure onto its response. Total: every variant has an answer.
pub fn translate(err: &RelayError) -> ErrorResponse {
    match err {
        RelayError::AdmissionRejected => {
            ErrorResponse::new(StatusCode::NOT_FOUND, ErrorKind::AdmissionRejected, NOT_FOUND_MESSAGE)
        }
        RelayError::NotFound(_) => {
            ErrorResponse::new(StatusCode::NOT_FOUND, ErrorKind::NotFound, USER_NOT_FOUND_MESSAGE)
        }
        RelayError::BadParameter(msg) => {
            ErrorResponse::new(StatusCode::BAD_REQUEST, ErrorKind::BadParameter, msg.clone()).typed()
        }
        RelayError::NotAuthenticated => ErrorResponse::new(
            StatusCode::UNAUTHORIZED,
            ErrorKind::NotAuthenticated,
            "VRChat client is not authenticated",
        )
        .typed(),
        RelayError::UpstreamRateLimited { status, .. } => ErrorResponse::new(
            StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::UpstreamRateLimited,
            "Rate limited by VRChat API, try again later",
        )
        .typed()
        .with_upstream_status(*status),
        RelayError::UpstreamClient { status, message } => ErrorResponse::new(
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
            ErrorKind::UpstreamClientError,
            format!("VRChat API error: {}", message),
        )
        .typed()
        .with_upstream_status(*status),
        RelayError::UpstreamServer { status, .. } => ErrorResponse::new(
            StatusCode::BAD_GATEWAY,
            ErrorKind::UpstreamServerError,
            "VRChat API is currently unavailable",
        )
        .typed()
        .with_upstream_status(*status),
        RelayError::Network(_) => ErrorResponse::new(
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::NetworkError,
            "Unable to reach VRChat API",
        )
        .typed(),
        RelayError::Unknown(_) => ErrorResponse::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Unknown,
            "Internal server error",
        )
        .typed(),
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let translated = translate(&self);

        match translated.status.as_u16() {
            // Expected outcomes; detail stays in debug logs only
            404 => tracing::debug!(reason = %self, "Responding not found"),
            400..=499 => tracing::warn!(kind = translated.kind.as_str(), error = %self, "Client-visible failure"),
            _ => tracing::error!(kind = translated.kind.as_str(), error = %self, "Request failed"),
        }

        translated.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotFoundReason;

    fn body_json(err: RelayError) -> serde_json::Value {
        serde_json::to_value(translate(&err).body).unwrap()
    }

    #[test]
    fn test_status_table() {
        let cases = vec![
            (RelayError::NotFound(NotFoundReason::NoCandidates), 404),
            (RelayError::NotAuthenticated, 401),
            (RelayError::BadParameter("username".into()), 400),
            (RelayError::UpstreamRateLimited { status: 429, message: "x".into() }, 429),
            (RelayError::UpstreamClient { status: 403, message: "x".into() }, 403),
            (RelayError::UpstreamClient { status: 401, message: "x".into() }, 401),
            (RelayError::UpstreamServer { status: 500, message: "x".into() }, 502),
            (RelayError::UpstreamServer { status: 503, message: "x".into() }, 502),
            (RelayError::Network("timeout".into()), 503),
            (RelayError::Unknown("???".into()), 500),
            (RelayError::AdmissionRejected, 404),
        ];

        for (err, expected) in cases {
            assert_eq!(translate(&err).status.as_u16(), expected, "{:?}", err);
        }
    }

    #[test]
    fn test_not_found_bodies_are_exact() {
        assert_eq!(
            body_json(RelayError::AdmissionRejected),
            serde_json::json!({ "error": "Not found" })
        );
        assert_eq!(
            body_json(RelayError::NotFound(NotFoundReason::NoCandidates)),
            serde_json::json!({ "error": "User not found" })
        );
        assert_eq!(
            body_json(RelayError::NotFound(NotFoundReason::NoExactMatch { candidates: 4 })),
            serde_json::json!({ "error": "User not found" })
        );
    }

    #[test]
    fn test_upstream_errors_carry_type_and_code() {
        let body = body_json(RelayError::UpstreamRateLimited { status: 429, message: "slow".into() });
        assert_eq!(body["errorType"], "upstream_rate_limited");
        assert_eq!(body["statusCode"], 429);

        let body = body_json(RelayError::Network("reset".into()));
        assert_eq!(body["errorType"], "network_error");
        assert!(body.get("statusCode").is_none());
    }

    #[test]
    fn test_unknown_hides_detail() {
        let translated = translate(&RelayError::Unknown("secret internals".into()));
        assert!(!translated.message().contains("secret"));
    }
}
