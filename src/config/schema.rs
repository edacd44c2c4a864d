//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.
//! Credentials are deliberately absent: they only come from the environment
//! (see [`Credentials::from_env`]).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Caller allow-lists.
    pub admission: AdmissionConfig,

    /// VRChat API settings.
    pub upstream: UpstreamConfig,

    /// Outbound call spacing.
    pub cooldown: CooldownConfig,

    /// Session persistence settings.
    pub session: SessionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Timeout applied by the HTTP client to each VRChat call, in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            upstream_secs: 15,
        }
    }
}

/// Static allow-lists checked before a check request touches anything else.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Exact `User-Agent` values accepted.
    pub user_agents: Vec<String>,

    /// Header carrying the client's runtime version.
    pub runtime_version_header: String,

    /// Accepted runtime versions.
    pub runtime_versions: Vec<String>,

    /// Name of the query parameter (or header) carrying the caller tag.
    pub caller_tag_name: String,

    /// Accepted caller tags.
    pub caller_tags: Vec<String>,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            user_agents: vec![
                "UnityPlayer/2022.3.22f1-DWR (UnityWebRequest/1.0, libcurl/8.5.0-DEV)".to_string(),
            ],
            runtime_version_header: "x-unity-version".to_string(),
            runtime_versions: vec!["2022.3.22f1-DWR".to_string()],
            caller_tag_name: "calledfrom".to_string(),
            caller_tags: vec!["loveworld".to_string()],
        }
    }
}

/// VRChat API client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// API base URL, without a trailing slash.
    pub base_url: String,

    /// User agent sent to VRChat. Their API terms require a contact.
    pub user_agent: String,

    /// Candidates requested per search (VRChat caps this at 100).
    pub search_page_size: u32,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.vrchat.cloud/api/1".to_string(),
            user_agent: format!("vrc-age-relay/{} (ops@example.com)", env!("CARGO_PKG_VERSION")),
            search_page_size: 100,
        }
    }
}

/// Cooldown gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CooldownConfig {
    /// Minimum spacing between outbound lookups in milliseconds.
    pub interval_ms: u64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self { interval_ms: 3000 }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SessionConfig {
    /// File holding the saved auth cookies. Persistence is off when unset.
    pub persist_path: Option<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// VRChat account credentials.
///
/// Loaded ONLY from environment variables. `Debug` redacts every secret.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Base32 TOTP secret, when the account has authenticator 2FA enabled.
    pub totp_secret: Option<String>,
}

impl Credentials {
    pub const USERNAME_VAR: &'static str = "VRCHAT_USERNAME";
    pub const PASSWORD_VAR: &'static str = "VRCHAT_PASSWORD";
    pub const TOTP_SECRET_VAR: &'static str = "VRCHAT_TOTP_SECRET";

    /// Read credentials from the process environment.
    ///
    /// Returns the name of the first missing variable on failure.
    pub fn from_env() -> Result<Self, &'static str> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, &'static str>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let username = non_empty(Self::USERNAME_VAR).ok_or(Self::USERNAME_VAR)?;
        let password = non_empty(Self::PASSWORD_VAR).ok_or(Self::PASSWORD_VAR)?;
        let totp_secret = non_empty(Self::TOTP_SECRET_VAR);

        Ok(Self {
            username,
            password,
            totp_secret,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("totp_secret", &self.totp_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.cooldown.interval_ms, 3000);
        assert_eq!(config.upstream.search_page_size, 100);
        assert_eq!(config.admission.caller_tag_name, "calledfrom");
        assert!(config.admission.caller_tags.contains(&"loveworld".to_string()));
        assert!(config.session.persist_path.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: RelayConfig = toml::from_str(
            r#"
            [cooldown]
            interval_ms = 5000

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.cooldown.interval_ms, 5000);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
    }

    #[test]
    fn test_credentials_from_lookup() {
        let env: HashMap<&str, &str> = [
            ("VRCHAT_USERNAME", "relaybot"),
            ("VRCHAT_PASSWORD", "hunter2"),
            ("VRCHAT_TOTP_SECRET", ""),
        ]
        .into_iter()
        .collect();

        let creds = Credentials::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(creds.username, "relaybot");
        assert!(creds.totp_secret.is_none());

        let debug = format!("{:?}", creds);
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_credentials_missing_password() {
        let err = Credentials::from_lookup(|k| {
            (k == "VRCHAT_USERNAME").then(|| "relaybot".to_string())
        })
        .unwrap_err();
        assert_eq!(err, "VRCHAT_PASSWORD");
    }
}
