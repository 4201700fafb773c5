//! Signed session tokens for authenticated admin clients.
//!
//! The token is stored in a browser cookie. It consists of the admin account id and the time of
//! login, followed by an HMAC-SHA256 signature over both, keyed with the application secret:
//! `<base64(admin_id:issued_at)>.<base64(signature)>`. Tokens with an invalid signature or an
//! issue time older than the maximum session age are rejected.

use crate::data_store::AdminId;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::hmac;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    admin_id: AdminId,
    issued_at: i64,
}

impl SessionToken {
    /// Create a new session token for the given admin, issued now.
    pub fn new(admin_id: AdminId) -> Self {
        Self {
            admin_id,
            issued_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn admin_id(&self) -> AdminId {
        self.admin_id
    }

    /// Parse and verify a session token string, created by [Self::as_string] with the same secret.
    pub fn from_string(data: &str, secret: &str, max_age: Duration) -> Result<Self, SessionError> {
        Self::from_string_at(data, secret, max_age, chrono::Utc::now().timestamp())
    }

    fn from_string_at(
        data: &str,
        secret: &str,
        max_age: Duration,
        now: i64,
    ) -> Result<Self, SessionError> {
        let (payload, signature) = data
            .split_once('.')
            .ok_or(SessionError::InvalidTokenStructure)?;
        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| SessionError::InvalidTokenStructure)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| SessionError::InvalidTokenStructure)?;
        hmac::verify(&signing_key(secret), &payload, &signature)
            .map_err(|_| SessionError::SignatureVerificationFailed)?;

        let payload = String::from_utf8(payload).map_err(|_| SessionError::InvalidTokenStructure)?;
        let (admin_id, issued_at) = payload
            .split_once(':')
            .ok_or(SessionError::InvalidTokenStructure)?;
        let token = Self {
            admin_id: admin_id
                .parse()
                .map_err(|_| SessionError::InvalidTokenStructure)?,
            issued_at: issued_at
                .parse()
                .map_err(|_| SessionError::InvalidTokenStructure)?,
        };
        if now.saturating_sub(token.issued_at) > max_age.as_secs() as i64 {
            return Err(SessionError::ExpiredToken);
        }
        Ok(token)
    }

    /// Serialize and sign the session token.
    pub fn as_string(&self, secret: &str) -> String {
        let payload = format!("{}:{}", self.admin_id, self.issued_at);
        let signature = hmac::sign(&signing_key(secret), payload.as_bytes());
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload.as_bytes()),
            URL_SAFE_NO_PAD.encode(signature.as_ref())
        )
    }
}

fn signing_key(secret: &str) -> hmac::Key {
    hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    InvalidTokenStructure,
    SignatureVerificationFailed,
    ExpiredToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef";
    const MAX_AGE: Duration = Duration::from_secs(3600);

    #[test]
    fn test_roundtrip() {
        let token = SessionToken::new(17);
        let parsed = SessionToken::from_string(&token.as_string(SECRET), SECRET, MAX_AGE).unwrap();
        assert_eq!(parsed, token);
        assert_eq!(parsed.admin_id(), 17);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let data = SessionToken::new(17).as_string(SECRET);
        assert_eq!(
            SessionToken::from_string(&data, "fedcba9876543210", MAX_AGE),
            Err(SessionError::SignatureVerificationFailed)
        );
    }

    #[test]
    fn test_modified_payload_is_rejected() {
        let data = SessionToken::new(17).as_string(SECRET);
        let (_, signature) = data.split_once('.').unwrap();
        let forged_payload = URL_SAFE_NO_PAD.encode(format!("1:{}", chrono::Utc::now().timestamp()));
        assert_eq!(
            SessionToken::from_string(
                &format!("{}.{}", forged_payload, signature),
                SECRET,
                MAX_AGE
            ),
            Err(SessionError::SignatureVerificationFailed)
        );
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = SessionToken {
            admin_id: 3,
            issued_at: 1_000_000,
        };
        let data = token.as_string(SECRET);
        assert_eq!(
            SessionToken::from_string_at(&data, SECRET, MAX_AGE, 1_000_000 + 3600),
            Ok(token)
        );
        assert_eq!(
            SessionToken::from_string_at(&data, SECRET, MAX_AGE, 1_000_000 + 3601),
            Err(SessionError::ExpiredToken)
        );
    }

    #[test]
    fn test_garbage_is_rejected() {
        for data in ["", "abc", "abc.def", "...", "%%%.%%%"] {
            assert!(SessionToken::from_string(data, SECRET, MAX_AGE).is_err());
        }
    }
}
