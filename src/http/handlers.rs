//! Route handlers.

use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use url::form_urlencoded;

use crate::error::RelayError;
use crate::http::server::AppState;

pub const USERNAME_PARAM: &str = "username";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub vrchat_client_ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticated_user: Option<String>,
}

/// Success body. The verified flag is the string `"true"` or `"false"`.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CheckResponse {
    #[serde(rename = "age-verified")]
    pub age_verified: &'static str,
    pub username: String,
}

/// `GET /health`: readiness of the VRChat session. Not admission-filtered.
pub async fn health(State(state): State<AppState>) -> Response {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    match state.session.current_identity() {
        Some(user) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                timestamp,
                error: None,
                vrchat_client_ready: true,
                authenticated_user: Some(user),
            }),
        )
            .into_response(),
        None => {
            let error = state
                .session
                .failure_reason()
                .unwrap_or_else(|| "VRChat client not initialized".to_string());
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy",
                    timestamp,
                    error: Some(error),
                    vrchat_client_ready: false,
                    authenticated_user: None,
                }),
            )
                .into_response()
        }
    }
}

/// `GET /checkAdultStatus?username=<name>`: runs behind the admission layer.
pub async fn check_adult_status(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<CheckResponse>, RelayError> {
    let username = extract_username(query.as_deref())?;
    tracing::info!(username = %username, "Checking age verification");

    let resolved = state.resolver.resolve_adult_status(&username).await?;

    Ok(Json(CheckResponse {
        age_verified: if resolved.classification.is_adult() { "true" } else { "false" },
        username: resolved.display_name,
    }))
}

/// Fallback for unknown routes and unsupported methods.
pub async fn not_found() -> Response {
    RelayError::AdmissionRejected.into_response()
}

/// Exactly one non-empty `username` value, taken verbatim.
pub fn extract_username(query: Option<&str>) -> Result<String, RelayError> {
    let mut values = form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .filter(|(key, _)| key == USERNAME_PARAM)
        .map(|(_, value)| value.into_owned());

    match (values.next(), values.next()) {
        (Some(name), None) if !name.is_empty() => Ok(name),
        (Some(_), Some(_)) => Err(RelayError::BadParameter(
            "Username parameter must be a single string".to_string(),
        )),
        _ => Err(RelayError::BadParameter("Username parameter is required".to_string())),
    }
}
