//! Admission filter for check requests.
//!
//! Three independent allow-list checks: `User-Agent`, runtime version header,
//! and caller tag (query parameter first, then header of the same name). A
//! failed check answers exactly like an unknown route.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::InvalidHeaderName, header::USER_AGENT, HeaderMap, HeaderName, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use url::form_urlencoded;

use crate::config::AdmissionConfig;
use crate::error::RelayError;
use crate::observability::metrics;

/// Which check rejected a request. Logged, never returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    UserAgent,
    RuntimeVersion,
    CallerTag,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::UserAgent => "user_agent",
            Rejection::RuntimeVersion => "runtime_version",
            Rejection::CallerTag => "caller_tag",
        }
    }
}

/// Immutable allow-lists built once from configuration.
#[derive(Debug, Clone)]
pub struct AdmissionFilter {
    user_agents: HashSet<String>,
    runtime_header: HeaderName,
    runtime_versions: HashSet<String>,
    caller_tag_name: String,
    caller_tag_header: HeaderName,
    caller_tags: HashSet<String>,
}

impl AdmissionFilter {
    pub fn from_config(config: &AdmissionConfig) -> Result<Self, InvalidHeaderName> {
        Ok(Self {
            user_agents: config.user_agents.iter().cloned().collect(),
            runtime_header: HeaderName::from_bytes(config.runtime_version_header.as_bytes())?,
            runtime_versions: config.runtime_versions.iter().cloned().collect(),
            caller_tag_name: config.caller_tag_name.clone(),
            caller_tag_header: HeaderName::from_bytes(config.caller_tag_name.as_bytes())?,
            caller_tags: config.caller_tags.iter().cloned().collect(),
        })
    }

    /// Decide pass/reject for a request's headers and raw query string.
    pub fn evaluate(&self, headers: &HeaderMap, query: Option<&str>) -> Result<(), Rejection> {
        let user_agent = header_str(headers, &USER_AGENT);
        if !user_agent.is_some_and(|ua| self.user_agents.contains(ua)) {
            return Err(Rejection::UserAgent);
        }

        let runtime = header_str(headers, &self.runtime_header);
        if !runtime.is_some_and(|v| self.runtime_versions.contains(v)) {
            return Err(Rejection::RuntimeVersion);
        }

        let tag = self
            .query_caller_tag(query)
            .or_else(|| header_str(headers, &self.caller_tag_header).map(str::to_string));
        if !tag.is_some_and(|t| self.caller_tags.contains(&t)) {
            return Err(Rejection::CallerTag);
        }

        Ok(())
    }

    pub fn admits(&self, headers: &HeaderMap, query: Option<&str>) -> bool {
        self.evaluate(headers, query).is_ok()
    }

    fn query_caller_tag(&self, query: Option<&str>) -> Option<String> {
        form_urlencoded::parse(query?.as_bytes())
            .find(|(key, _)| key == self.caller_tag_name.as_str())
            .map(|(_, value)| value.into_owned())
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Route layer guarding the check endpoint.
pub async fn admission_middleware(
    State(filter): State<Arc<AdmissionFilter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    match filter.evaluate(req.headers(), req.uri().query()) {
        Ok(()) => next.run(req).await,
        Err(rejection) => {
            tracing::debug!(check = rejection.as_str(), path = %req.uri().path(), "Admission rejected");
            metrics::record_admission_rejected(rejection.as_str());
            RelayError::AdmissionRejected.into_response()
        }
    }
}
