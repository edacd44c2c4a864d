//! VRChat REST client with cookie-based sessions.
//!
//! # Responsibilities
//! - Log in with HTTP Basic credentials and complete TOTP verification
//! - Carry the `auth` / `twoFactorAuth` cookies on every call
//! - Search users and fetch profiles
//! - Map transport and status failures onto [`UpstreamError`]

use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use url::form_urlencoded;

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::observability::metrics;
use crate::upstream::types::{
    extract_error_message, AuthCookies, CandidateUser, CurrentUser, LoginOutcome, UpstreamError,
    UpstreamResult, UserProfile,
};
use crate::upstream::VrchatApi;

/// `GET /auth/user` answers with this shape while a second factor is pending.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TwoFactorChallenge {
    requires_two_factor_auth: Vec<String>,
}

#[derive(Deserialize)]
struct TotpVerifyResponse {
    verified: bool,
}

/// reqwest-backed [`VrchatApi`] implementation.
pub struct VrchatClient {
    http: reqwest::Client,
    base_url: String,
    cookies: RwLock<AuthCookies>,
}

impl VrchatClient {
    /// Build a client from configuration. No network traffic happens here.
    pub fn new(upstream: &UpstreamConfig, timeouts: &TimeoutConfig) -> UpstreamResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(upstream.user_agent.clone())
            .timeout(Duration::from_secs(timeouts.upstream_secs))
            .build()
            .map_err(|e| UpstreamError::Client(e.to_string()))?;

        Ok(Self {
            http,
            base_url: upstream.base_url.trim_end_matches('/').to_string(),
            cookies: RwLock::new(AuthCookies::default()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach cookies, send, capture new cookies and classify the status.
    async fn send(&self, builder: RequestBuilder, op: &'static str) -> UpstreamResult<Response> {
        let cookie_header = self
            .cookies
            .read()
            .expect("cookie lock poisoned")
            .header_value();
        let builder = match cookie_header {
            Some(value) => builder.header(COOKIE, value),
            None => builder,
        };

        let start = Instant::now();
        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(op, error = %e, "VRChat request failed before a response");
                metrics::record_upstream_call(op, "network", start);
                return Err(UpstreamError::from(e));
            }
        };

        {
            let mut cookies = self.cookies.write().expect("cookie lock poisoned");
            for value in response.headers().get_all(SET_COOKIE) {
                if let Ok(value) = value.to_str() {
                    cookies.absorb_set_cookie(value);
                }
            }
        }

        let status = response.status();
        if status.is_success() {
            metrics::record_upstream_call(op, "ok", start);
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| "unknown error".to_string());

        tracing::warn!(op, status = status.as_u16(), message = %message, "VRChat returned an error");
        metrics::record_upstream_call(op, &status.as_u16().to_string(), start);

        Err(UpstreamError::from_status(status.as_u16(), message))
    }

    /// Decode an `/auth/user` body into either a user or a 2FA challenge.
    async fn read_login_outcome(response: Response) -> UpstreamResult<LoginOutcome> {
        let value: serde_json::Value = response.json().await?;

        if value.get("requiresTwoFactorAuth").is_some() {
            let challenge: TwoFactorChallenge =
                serde_json::from_value(value).map_err(|e| UpstreamError::Decode(e.to_string()))?;
            return Ok(LoginOutcome::TwoFactorRequired(challenge.requires_two_factor_auth));
        }

        let user: CurrentUser =
            serde_json::from_value(value).map_err(|e| UpstreamError::Decode(e.to_string()))?;
        Ok(LoginOutcome::Authenticated(user))
    }
}

/// VRChat expects `base64(urlencode(user) ":" urlencode(pass))`, with
/// encodeURIComponent semantics (space as `%20`).
pub(crate) fn basic_credentials(username: &str, password: &str) -> String {
    let encode = |s: &str| form_urlencoded::byte_serialize(s.as_bytes()).collect::<String>().replace('+', "%20");
    let raw = format!("{}:{}", encode(username), encode(password));
    format!("Basic {}", BASE64.encode(raw))
}

#[async_trait]
impl VrchatApi for VrchatClient {
    async fn login(&self, username: &str, password: &str) -> UpstreamResult<LoginOutcome> {
        let request = self
            .http
            .get(self.url("/auth/user"))
            .header(AUTHORIZATION, basic_credentials(username, password));
        let response = self.send(request, "login").await?;
        Self::read_login_outcome(response).await
    }

    async fn current_user(&self) -> UpstreamResult<LoginOutcome> {
        let response = self.send(self.http.get(self.url("/auth/user")), "current_user").await?;
        Self::read_login_outcome(response).await
    }

    async fn verify_totp(&self, code: &str) -> UpstreamResult<bool> {
        let request = self
            .http
            .post(self.url("/auth/twofactorauth/totp/verify"))
            .json(&serde_json::json!({ "code": code }));
        let response = self.send(request, "verify_totp").await?;
        let body: TotpVerifyResponse = response.json().await?;
        Ok(body.verified)
    }

    async fn search_users(&self, query: &str, limit: u32) -> UpstreamResult<Vec<CandidateUser>> {
        let request = self.http.get(self.url("/users")).query(&[
            ("search", query.to_string()),
            ("n", limit.to_string()),
            ("fuzzy", "false".to_string()),
        ]);
        let response = self.send(request, "search_users").await?;
        Ok(response.json().await?)
    }

    async fn get_user(&self, id: &str) -> UpstreamResult<UserProfile> {
        let id: String = form_urlencoded::byte_serialize(id.as_bytes()).collect();
        let response = self
            .send(self.http.get(self.url(&format!("/users/{}", id))), "get_user")
            .await?;
        Ok(response.json().await?)
    }

    fn auth_cookies(&self) -> AuthCookies {
        self.cookies.read().expect("cookie lock poisoned").clone()
    }

    fn restore_auth_cookies(&self, cookies: AuthCookies) {
        *self.cookies.write().expect("cookie lock poisoned") = cookies;
    }
}

impl std::fmt::Debug for VrchatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VrchatClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_credentials_encoding() {
        // "a b" -> "a%20b", "p@ss:" -> "p%40ss%3A"
        let header = basic_credentials("a b", "p@ss:");
        let encoded = header.strip_prefix("Basic ").unwrap();
        let decoded = String::from_utf8(BASE64.decode(encoded).unwrap()).unwrap();
        assert_eq!(decoded, "a%20b:p%40ss%3A");
    }

    #[test]
    fn test_client_creation_trims_base_url() {
        let mut upstream = UpstreamConfig::default();
        upstream.base_url = "http://127.0.0.1:9/api/1/".to_string();
        let client = VrchatClient::new(&upstream, &TimeoutConfig::default()).unwrap();
        assert_eq!(client.url("/users"), "http://127.0.0.1:9/api/1/users");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_network_error() {
        let mut upstream = UpstreamConfig::default();
        // Port 9 (discard) is closed on CI hosts; connection is refused fast.
        upstream.base_url = "http://127.0.0.1:9".to_string();
        let timeouts = TimeoutConfig { upstream_secs: 2 };
        let client = VrchatClient::new(&upstream, &timeouts).unwrap();

        let err = client.search_users("Alice", 100).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Network(_)));
    }

    #[test]
    fn test_cookie_restore() {
        let client = VrchatClient::new(&UpstreamConfig::default(), &TimeoutConfig::default()).unwrap();
        assert!(client.auth_cookies().is_empty());

        client.restore_auth_cookies(AuthCookies {
            auth: Some("authcookie_1".into()),
            two_factor_auth: None,
        });
        assert_eq!(client.auth_cookies().auth.as_deref(), Some("authcookie_1"));
    }
}
