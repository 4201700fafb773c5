//! Salted password hashing for admin accounts, based on PBKDF2-HMAC-SHA256 from `ring`.
//!
//! Hashes are stored as a single string `pbkdf2-sha256$<iterations>$<salt>$<hash>`, with salt and
//! hash encoded as unpadded base64.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use ring::rand::{SecureRandom, SystemRandom};
use ring::{digest, pbkdf2};
use std::num::NonZeroU32;

static ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;
const SCHEME: &str = "pbkdf2-sha256";
const ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = digest::SHA256_OUTPUT_LEN;

#[derive(Debug)]
pub struct PasswordHashError;

impl std::fmt::Display for PasswordHashError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Could not generate random salt for password hash")
    }
}

pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let mut salt = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| PasswordHashError)?;
    let iterations = NonZeroU32::new(ITERATIONS).ok_or(PasswordHashError)?;
    let mut hash = [0u8; HASH_LEN];
    pbkdf2::derive(ALGORITHM, iterations, &salt, password.as_bytes(), &mut hash);
    Ok(format!(
        "{}${}${}${}",
        SCHEME,
        ITERATIONS,
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash)
    ))
}

/// Check a password against a stored hash string. Malformed hash strings never verify.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let mut parts = stored_hash.split('$');
    let (Some(SCHEME), Some(iterations), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    let Some(iterations) = iterations.parse().ok().and_then(NonZeroU32::new) else {
        return false;
    };
    let (Ok(salt), Ok(hash)) = (STANDARD_NO_PAD.decode(salt), STANDARD_NO_PAD.decode(hash)) else {
        return false;
    };
    pbkdf2::verify(ALGORITHM, iterations, &salt, password.as_bytes(), &hash).is_ok()
}

/// Like [verify_password], but for a possibly unknown account. Without a stored hash, the same
/// key derivation is run against a fixed dummy hash, so the response time does not tell whether
/// the account exists.
pub fn verify_password_of_account(password: &str, stored_hash: Option<&str>) -> bool {
    match stored_hash {
        Some(stored_hash) => verify_password(password, stored_hash),
        None => {
            let dummy_salt = [0u8; SALT_LEN];
            let dummy_hash = [0u8; HASH_LEN];
            if let Some(iterations) = NonZeroU32::new(ITERATIONS) {
                let _ = pbkdf2::verify(
                    ALGORITHM,
                    iterations,
                    &dummy_salt,
                    password.as_bytes(),
                    &dummy_hash,
                );
            }
            false
        }
    }
}
