//! Time-based one-time passwords (RFC 6238) for VRChat's authenticator 2FA.
//!
//! VRChat uses the common authenticator-app parameters: HMAC-SHA1, 30 second
//! steps, 6 digits.

use data_encoding::BASE32_NOPAD;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use thiserror::Error;

type HmacSha1 = Hmac<Sha1>;

const STEP_SECS: u64 = 30;
const DIGITS: u32 = 6;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TotpError {
    #[error("TOTP secret is empty")]
    Empty,

    #[error("TOTP secret is not valid base32")]
    InvalidSecret,
}

/// A TOTP generator bound to one shared secret.
#[derive(Clone)]
pub struct Totp {
    secret: Vec<u8>,
}

impl Totp {
    /// Parse a base32 secret as shown by VRChat's 2FA setup page.
    ///
    /// Spaces, lowercase letters and `=` padding are tolerated.
    pub fn from_base32(secret: &str) -> Result<Self, TotpError> {
        let normalized: String = secret
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '=' && *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if normalized.is_empty() {
            return Err(TotpError::Empty);
        }

        let secret = BASE32_NOPAD
            .decode(normalized.as_bytes())
            .map_err(|_| TotpError::InvalidSecret)?;

        Ok(Self { secret })
    }

    /// Code for the step containing `unix_secs`.
    pub fn code_at(&self, unix_secs: u64) -> Result<String, TotpError> {
        let counter = unix_secs / STEP_SECS;

        let mut mac =
            HmacSha1::new_from_slice(&self.secret).map_err(|_| TotpError::InvalidSecret)?;
        mac.update(&counter.to_be_bytes());
        let digest = mac.finalize().into_bytes();

        // Dynamic truncation
        let offset = (digest[digest.len() - 1] & 0x0f) as usize;
        let binary = u32::from_be_bytes([
            digest[offset] & 0x7f,
            digest[offset + 1],
            digest[offset + 2],
            digest[offset + 3],
        ]);

        let code = binary % 10u32.pow(DIGITS);
        Ok(format!("{:0width$}", code, width = DIGITS as usize))
    }

    /// Code for the current wall-clock time.
    pub fn current_code(&self) -> Result<String, TotpError> {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        self.code_at(now)
    }
}

impl std::fmt::Debug for Totp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Totp").field("secret", &"<redacted>").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 6238 appendix B secret ("12345678901234567890"), truncated to 6 digits.
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn test_rfc6238_vectors() {
        let totp = Totp::from_base32(RFC_SECRET).unwrap();
        assert_eq!(totp.code_at(59).unwrap(), "287082");
        assert_eq!(totp.code_at(1_111_111_109).unwrap(), "081804");
        assert_eq!(totp.code_at(1_234_567_890).unwrap(), "005924");
        assert_eq!(totp.code_at(2_000_000_000).unwrap(), "279037");
    }

    #[test]
    fn test_codes_stable_within_step() {
        let totp = Totp::from_base32(RFC_SECRET).unwrap();
        assert_eq!(totp.code_at(60).unwrap(), totp.code_at(89).unwrap());
        assert_ne!(totp.code_at(89).unwrap(), totp.code_at(90).unwrap());
    }

    #[test]
    fn test_secret_normalization() {
        let spaced = Totp::from_base32("gezd gnbv gy3t qojq gezd gnbv gy3t qojq").unwrap();
        assert_eq!(spaced.code_at(59).unwrap(), "287082");
    }

    #[test]
    fn test_invalid_secrets() {
        assert_eq!(Totp::from_base32("  ").unwrap_err(), TotpError::Empty);
        assert_eq!(Totp::from_base32("not*base32!").unwrap_err(), TotpError::InvalidSecret);
    }

    #[test]
    fn test_current_code_shape() {
        let code = Totp::from_base32(RFC_SECRET).unwrap().current_code().unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }
}
