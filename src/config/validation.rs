//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, page size within VRChat's cap)
//! - Reject allow-lists that would make every check request fail
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use axum::http::HeaderName;

use crate::config::schema::RelayConfig;

/// Largest page VRChat's user search accepts.
pub const MAX_SEARCH_PAGE_SIZE: u32 = 100;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g. `cooldown.interval_ms`).
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a parsed configuration.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::new("timeouts.upstream_secs", "must be greater than 0"));
    }

    let admission = &config.admission;
    if admission.user_agents.is_empty() {
        errors.push(ValidationError::new("admission.user_agents", "must not be empty"));
    }
    if admission.runtime_versions.is_empty() {
        errors.push(ValidationError::new("admission.runtime_versions", "must not be empty"));
    }
    if admission.caller_tags.is_empty() {
        errors.push(ValidationError::new("admission.caller_tags", "must not be empty"));
    }
    if HeaderName::from_bytes(admission.runtime_version_header.as_bytes()).is_err() {
        errors.push(ValidationError::new(
            "admission.runtime_version_header",
            "is not a valid header name",
        ));
    }
    if HeaderName::from_bytes(admission.caller_tag_name.as_bytes()).is_err() {
        errors.push(ValidationError::new(
            "admission.caller_tag_name",
            "must also be usable as a header name",
        ));
    }

    match url::Url::parse(&config.upstream.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => errors.push(ValidationError::new(
            "upstream.base_url",
            format!("'{}' is not an http(s) URL", config.upstream.base_url),
        )),
    }
    if config.upstream.user_agent.trim().is_empty() {
        errors.push(ValidationError::new("upstream.user_agent", "must not be empty"));
    }
    if !(1..=MAX_SEARCH_PAGE_SIZE).contains(&config.upstream.search_page_size) {
        errors.push(ValidationError::new(
            "upstream.search_page_size",
            format!("must be between 1 and {}", MAX_SEARCH_PAGE_SIZE),
        ));
    }

    if config.cooldown.interval_ms == 0 {
        errors.push(ValidationError::new("cooldown.interval_ms", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
