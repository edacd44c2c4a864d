//! User resolution: display name → age-verification status.
//!
//! # Data Flow
//! ```text
//! resolve_adult_status(name)
//!     → session.handle()          (fail fast before readiness)
//!     → cooldown.admit()          (wait for our slot)
//!     → search_users(name, n)     (non-fuzzy, ordered)
//!     → matcher.rs                (first exact, case-sensitive hit)
//!     → get_user(id)              (only for the matched candidate)
//!     → AgeClassification
//! ```
//!
//! Nothing is cached; every call runs the whole sequence.

pub mod matcher;

use std::sync::Arc;

use crate::error::{NotFoundReason, RelayError};
use crate::resilience::CooldownGate;
use crate::session::SessionManager;

/// Age-verification classification of a resolved account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeClassification {
    VerifiedAdult,
    /// Anything other than an explicit adult marker, including "hidden".
    Undisclosed,
}

impl AgeClassification {
    /// The only status value that counts as verified.
    pub const ADULT_MARKER: &'static str = "18+";

    pub fn from_status(status: Option<&str>) -> Self {
        match status {
            Some(Self::ADULT_MARKER) => AgeClassification::VerifiedAdult,
            _ => AgeClassification::Undisclosed,
        }
    }

    pub fn is_adult(&self) -> bool {
        matches!(self, AgeClassification::VerifiedAdult)
    }
}

/// Outcome of one resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUser {
    pub id: String,
    pub display_name: String,
    pub classification: AgeClassification,
}

pub struct UserResolver {
    session: Arc<SessionManager>,
    cooldown: Arc<CooldownGate>,
    page_size: u32,
}

impl UserResolver {
    pub fn new(session: Arc<SessionManager>, cooldown: Arc<CooldownGate>, page_size: u32) -> Self {
        Self {
            session,
            cooldown,
            page_size,
        }
    }

    pub async fn resolve_adult_status(&self, display_name: &str) -> Result<ResolvedUser, RelayError> {
        let api = self.session.handle()?;

        self.cooldown.admit().await;

        let candidates = api.search_users(display_name, self.page_size).await?;
        if candidates.is_empty() {
            let reason = NotFoundReason::NoCandidates;
            tracing::info!(username = %display_name, %reason, "User not found");
            return Err(RelayError::NotFound(reason));
        }

        let Some(candidate) = matcher::find_exact_match(&candidates, display_name) else {
            let reason = NotFoundReason::NoExactMatch {
                candidates: candidates.len(),
            };
            tracing::info!(username = %display_name, %reason, "User not found");
            return Err(RelayError::NotFound(reason));
        };

        let profile = api.get_user(&candidate.id).await?;
        let classification =
            AgeClassification::from_status(profile.age_verification_status.as_deref());

        tracing::info!(
            username = %candidate.display_name,
            user_id = %candidate.id,
            adult = classification.is_adult(),
            "Resolved age verification"
        );

        Ok(ResolvedUser {
            id: candidate.id.clone(),
            display_name: candidate.display_name.clone(),
            classification,
        })
    }
}
