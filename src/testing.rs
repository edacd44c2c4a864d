//! In-memory VRChat stand-in for unit and integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::upstream::{
    AuthCookies, CandidateUser, CurrentUser, LoginOutcome, UpstreamError, UpstreamResult,
    UserProfile, VrchatApi,
};

/// Scriptable fake of the VRChat API that records every call.
pub struct FakeVrchat {
    account: String,
    require_totp: bool,
    totp_accepted: AtomicBool,
    login_error: Option<UpstreamError>,
    search_error: Option<UpstreamError>,
    profile_error: Option<UpstreamError>,
    search_results: HashMap<String, Vec<CandidateUser>>,
    profiles: HashMap<String, UserProfile>,
    cookies: Mutex<AuthCookies>,
    calls: Mutex<Vec<(&'static str, String)>>,
    search_limits: Mutex<Vec<u32>>,
}

impl FakeVrchat {
    /// The only `auth` cookie value the fake accepts.
    pub const VALID_AUTH_COOKIE: &'static str = "authcookie_fake_valid";

    pub fn new() -> Self {
        Self {
            account: "RelayBot".to_string(),
            require_totp: false,
            totp_accepted: AtomicBool::new(true),
            login_error: None,
            search_error: None,
            profile_error: None,
            search_results: HashMap::new(),
            profiles: HashMap::new(),
            cookies: Mutex::new(AuthCookies::default()),
            calls: Mutex::new(Vec::new()),
            search_limits: Mutex::new(Vec::new()),
        }
    }

    pub fn with_account(mut self, display_name: &str) -> Self {
        self.account = display_name.to_string();
        self
    }

    pub fn requiring_totp(mut self) -> Self {
        self.require_totp = true;
        self
    }

    pub fn rejecting_totp(self) -> Self {
        self.totp_accepted.store(false, Ordering::SeqCst);
        self
    }

    pub fn failing_login(mut self, err: UpstreamError) -> Self {
        self.login_error = Some(err);
        self
    }

    pub fn failing_search(mut self, err: UpstreamError) -> Self {
        self.search_error = Some(err);
        self
    }

    pub fn failing_profile(mut self, err: UpstreamError) -> Self {
        self.profile_error = Some(err);
        self
    }

    /// Script the ordered hits for one search query. Ids are `usr_<index>_<name>`.
    pub fn with_search(mut self, query: &str, display_names: &[&str]) -> Self {
        let hits = display_names
            .iter()
            .enumerate()
            .map(|(i, name)| CandidateUser {
                id: Self::user_id(i, name),
                display_name: name.to_string(),
            })
            .collect();
        self.search_results.insert(query.to_string(), hits);
        self
    }

    /// Register a profile for the candidate at `index` of a scripted search.
    pub fn with_profile(mut self, index: usize, display_name: &str, age_status: Option<&str>) -> Self {
        let id = Self::user_id(index, display_name);
        self.profiles.insert(
            id.clone(),
            UserProfile {
                id,
                display_name: display_name.to_string(),
                age_verification_status: age_status.map(str::to_string),
            },
        );
        self
    }

    pub fn user_id(index: usize, display_name: &str) -> String {
        format!("usr_{}_{}", index, display_name)
    }

    pub fn set_totp_accepted(&self, accepted: bool) {
        self.totp_accepted.store(accepted, Ordering::SeqCst);
    }

    /// How many times `op` was invoked.
    pub fn calls(&self, op: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| *name == op)
            .count()
    }

    /// Arguments of every `op` invocation, in order.
    pub fn call_args(&self, op: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| *name == op)
            .map(|(_, arg)| arg.clone())
            .collect()
    }

    /// The `limit` passed to every search, in order.
    pub fn search_limits(&self) -> Vec<u32> {
        self.search_limits.lock().unwrap().clone()
    }

    fn record(&self, op: &'static str, arg: &str) {
        self.calls.lock().unwrap().push((op, arg.to_string()));
    }

    fn me(&self) -> CurrentUser {
        CurrentUser {
            id: "usr_relay".to_string(),
            display_name: self.account.clone(),
        }
    }
}

impl Default for FakeVrchat {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VrchatApi for FakeVrchat {
    async fn login(&self, username: &str, _password: &str) -> UpstreamResult<LoginOutcome> {
        self.record("login", username);
        if let Some(err) = &self.login_error {
            return Err(err.clone());
        }

        let mut cookies = self.cookies.lock().unwrap();
        cookies.auth = Some(Self::VALID_AUTH_COOKIE.to_string());
        cookies.two_factor_auth = None;

        if self.require_totp {
            Ok(LoginOutcome::TwoFactorRequired(vec!["totp".into(), "otp".into()]))
        } else {
            Ok(LoginOutcome::Authenticated(self.me()))
        }
    }

    async fn current_user(&self) -> UpstreamResult<LoginOutcome> {
        self.record("current_user", "");
        let cookies = self.cookies.lock().unwrap().clone();

        if cookies.auth.as_deref() != Some(Self::VALID_AUTH_COOKIE) {
            return Err(UpstreamError::Status {
                status: 401,
                message: "Missing Credentials".into(),
            });
        }
        if self.require_totp && cookies.two_factor_auth.is_none() {
            return Ok(LoginOutcome::TwoFactorRequired(vec!["totp".into()]));
        }
        Ok(LoginOutcome::Authenticated(self.me()))
    }

    async fn verify_totp(&self, code: &str) -> UpstreamResult<bool> {
        self.record("verify_totp", code);
        let well_formed = code.len() == 6 && code.chars().all(|c| c.is_ascii_digit());

        if well_formed && self.totp_accepted.load(Ordering::SeqCst) {
            self.cookies.lock().unwrap().two_factor_auth = Some("tfa_fake".to_string());
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn search_users(&self, query: &str, limit: u32) -> UpstreamResult<Vec<CandidateUser>> {
        self.record("search_users", query);
        self.search_limits.lock().unwrap().push(limit);
        if let Some(err) = &self.search_error {
            return Err(err.clone());
        }

        Ok(self
            .search_results
            .get(query)
            .map(|hits| hits.iter().take(limit as usize).cloned().collect())
            .unwrap_or_default())
    }

    async fn get_user(&self, id: &str) -> UpstreamResult<UserProfile> {
        self.record("get_user", id);
        if let Some(err) = &self.profile_error {
            return Err(err.clone());
        }

        self.profiles.get(id).cloned().ok_or_else(|| UpstreamError::Status {
            status: 404,
            message: "User not found".into(),
        })
    }

    fn auth_cookies(&self) -> AuthCookies {
        self.cookies.lock().unwrap().clone()
    }

    fn restore_auth_cookies(&self, cookies: AuthCookies) {
        *self.cookies.lock().unwrap() = cookies;
    }
}
