//! One-time login codes and password/secret verification.
//!
//! Raw codes are only ever mailed out; the store keeps a SHA-256 hash, and
//! redemption happens through a single atomic consume so a code can be used
//! at most once.

use crate::domain::Role;
use crate::store::{AuthCodeRecord, CodeGrant, Store};
use anyhow::{Context, Result};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Generate a new opaque login code. The raw value is only sent to the
/// user; the database stores a hash.
pub fn generate_auth_code() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate auth code")?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Hash a code so raw values never touch the database.
#[must_use]
pub fn hash_auth_code(code: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    hasher.finalize().to_vec()
}

/// Mint and persist a one-time code, returning the raw value for the email
/// link.
///
/// # Errors
/// Returns an error if code generation or persistence fails.
pub async fn create_auth_code(
    store: &dyn Store,
    ttl_seconds: i64,
    email: &str,
    role: Role,
    submission_id: Option<Uuid>,
) -> Result<String> {
    let code = generate_auth_code()?;
    store
        .insert_auth_code(AuthCodeRecord {
            code_hash: hash_auth_code(&code),
            email: email.to_string(),
            role,
            submission_id,
            expires_at: Utc::now() + Duration::seconds(ttl_seconds),
        })
        .await
        .context("failed to persist auth code")?;
    Ok(code)
}

/// Redeem a one-time code. Unknown, expired, already-used, and
/// role-mismatched codes all come back as `None`; the caller cannot tell
/// which. Consumption is atomic in the store.
///
/// # Errors
/// Returns an error only on storage failure.
pub async fn validate_auth_code(
    store: &dyn Store,
    code: &str,
    role: Option<Role>,
) -> Result<Option<CodeGrant>> {
    let hash = hash_auth_code(code);
    store
        .consume_auth_code(&hash, role, Utc::now())
        .await
        .context("failed to redeem auth code")
}

/// A configured PRO password hash must be a bcrypt string before we hand it
/// to the verifier; anything else is a deployment mistake, not a login
/// failure.
#[must_use]
pub fn bcrypt_hash_format_ok(hash: &str) -> bool {
    regex::Regex::new(r"^\$2[ayb]\$").is_ok_and(|regex| regex.is_match(hash))
}

/// Verify the PRO password against the configured bcrypt hash.
///
/// # Errors
/// Returns an error if the hash cannot be parsed by bcrypt.
pub fn verify_pro_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash).context("failed to verify password hash")
}

/// Constant-time string comparison for shared secrets: HMAC both sides with
/// a throwaway key and compare tags via `verify_slice`.
#[must_use]
pub fn secret_matches(candidate: &str, expected: &str) -> bool {
    let mut key = [0u8; 32];
    if OsRng.try_fill_bytes(&mut key).is_err() {
        return false;
    }
    let Ok(mut expected_mac) = HmacSha256::new_from_slice(&key) else {
        return false;
    };
    expected_mac.update(expected.as_bytes());
    let tag = expected_mac.finalize().into_bytes();

    let Ok(mut candidate_mac) = HmacSha256::new_from_slice(&key) else {
        return false;
    };
    candidate_mac.update(candidate.as_bytes());
    candidate_mac.verify_slice(&tag).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_code_decodes_to_32_bytes() {
        let decoded_len = generate_auth_code()
            .ok()
            .and_then(|code| URL_SAFE_NO_PAD.decode(code.as_bytes()).ok())
            .map(|bytes| bytes.len());
        assert_eq!(decoded_len, Some(32));
    }

    #[test]
    fn hash_auth_code_stable() {
        let first = hash_auth_code("code");
        let second = hash_auth_code("code");
        let different = hash_auth_code("other");
        assert_eq!(first, second);
        assert_ne!(first, different);
    }

    #[test]
    fn bcrypt_format_accepts_known_prefixes() {
        assert!(bcrypt_hash_format_ok("$2a$12$abcdefghijklmnopqrstuv"));
        assert!(bcrypt_hash_format_ok("$2b$10$abcdefghijklmnopqrstuv"));
        assert!(bcrypt_hash_format_ok("$2y$10$abcdefghijklmnopqrstuv"));
    }

    #[test]
    fn bcrypt_format_rejects_other_schemes() {
        assert!(!bcrypt_hash_format_ok("plaintext"));
        assert!(!bcrypt_hash_format_ok("$argon2id$v=19$..."));
        assert!(!bcrypt_hash_format_ok("$1$legacy"));
        assert!(!bcrypt_hash_format_ok(""));
    }

    #[test]
    fn verify_pro_password_round_trip() -> Result<()> {
        let hash = bcrypt::hash("hunter2", 4)?;
        assert!(verify_pro_password("hunter2", &hash)?);
        assert!(!verify_pro_password("hunter3", &hash)?);
        Ok(())
    }

    #[test]
    fn secret_matches_compares_exactly() {
        assert!(secret_matches("swordfish", "swordfish"));
        assert!(!secret_matches("swordfish", "Swordfish"));
        assert!(!secret_matches("", "swordfish"));
        assert!(secret_matches("", ""));
    }
}
