//! Stateless signed session tokens and cookie helpers.
//!
//! A token is `base64url(claims).base64url(hmac)` with the expiry embedded
//! in the claims, so no session table is needed. Verification is uniform:
//! tampered, expired, and malformed tokens all come back as `None`.

use crate::domain::Role;
use anyhow::{Context, Result, anyhow};
use axum::http::{
    HeaderMap, HeaderValue,
    header::{AUTHORIZATION, COOKIE, InvalidHeaderValue},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

pub const SESSION_COOKIE_NAME: &str = "fieldpost_session";

type HmacSha256 = Hmac<Sha256>;

/// A verified caller identity. Instances only come out of
/// [`SessionCodec::verify`], so downstream code can trust the fields;
/// unverified claims never cross this boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub email: String,
    pub role: Role,
    /// Present when the session was minted from a submission-scoped code.
    pub submission_id: Option<Uuid>,
}

/// Wire form of the session payload. Private to keep raw claims from being
/// used in place of a verified [`Session`].
#[derive(Serialize, Deserialize)]
struct Claims {
    email: String,
    role: Role,
    submission_id: Option<Uuid>,
    exp: i64,
}

pub struct SessionCodec {
    secret: SecretString,
    ttl_seconds: i64,
}

impl SessionCodec {
    #[must_use]
    pub const fn new(secret: SecretString, ttl_seconds: i64) -> Self {
        Self {
            secret,
            ttl_seconds,
        }
    }

    #[must_use]
    pub const fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Sign a session into a cookie-ready token.
    ///
    /// # Errors
    /// Returns an error if the claims fail to serialize.
    pub fn create(&self, session: &Session) -> Result<String> {
        let claims = Claims {
            email: session.email.clone(),
            role: session.role,
            submission_id: session.submission_id,
            exp: Utc::now().timestamp() + self.ttl_seconds,
        };
        let payload =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).context("serialize session")?);
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{payload}.{signature}"))
    }

    /// Verify a token. Returns `None` for any invalid token without
    /// distinguishing the reason.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<Session> {
        let (payload, signature) = token.split_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature.as_bytes()).ok()?;
        let mut mac = self.mac().ok()?;
        mac.update(payload.as_bytes());
        // Constant-time comparison; never compare MAC bytes with ==.
        mac.verify_slice(&signature).ok()?;
        let claims: Claims =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload.as_bytes()).ok()?).ok()?;
        if claims.exp <= Utc::now().timestamp() {
            return None;
        }
        Some(Session {
            email: claims.email,
            role: claims.role,
            submission_id: claims.submission_id,
        })
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| anyhow!("invalid session secret"))
    }
}

/// Build a secure `HttpOnly` cookie carrying the session token.
pub fn session_cookie(
    token: &str,
    ttl_seconds: i64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub fn clear_session_cookie(secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Pull the session token from the cookie or an `Authorization: Bearer`.
#[must_use]
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> SessionCodec {
        SessionCodec::new(SecretString::from("test-secret"), 3600)
    }

    fn session() -> Session {
        Session {
            email: "alice@example.com".to_string(),
            role: Role::TeamMember,
            submission_id: None,
        }
    }

    #[test]
    fn create_and_verify_round_trip() -> anyhow::Result<()> {
        let codec = codec();
        let token = codec.create(&session())?;
        assert_eq!(codec.verify(&token), Some(session()));
        Ok(())
    }

    #[test]
    fn submission_scope_survives_the_round_trip() -> anyhow::Result<()> {
        let codec = codec();
        let id = Uuid::new_v4();
        let scoped = Session {
            email: "lead@example.com".to_string(),
            role: Role::Leader,
            submission_id: Some(id),
        };
        let token = codec.create(&scoped)?;
        let verified = codec.verify(&token);
        assert_eq!(verified.and_then(|s| s.submission_id), Some(id));
        Ok(())
    }

    #[test]
    fn tampered_payload_is_rejected() -> anyhow::Result<()> {
        let codec = codec();
        let token = codec.create(&session())?;
        let (payload, signature) = token.split_once('.').map_or(("", ""), |parts| parts);
        let forged = Claims {
            email: "alice@example.com".to_string(),
            role: Role::Leader,
            submission_id: None,
            exp: Utc::now().timestamp() + 3600,
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged)?);
        assert!(codec.verify(&format!("{forged_payload}.{signature}")).is_none());
        assert!(codec.verify(&format!("{payload}.AAAA")).is_none());
        Ok(())
    }

    #[test]
    fn expired_token_is_rejected() -> anyhow::Result<()> {
        let expired = SessionCodec::new(SecretString::from("test-secret"), -10);
        let token = expired.create(&session())?;
        assert!(expired.verify(&token).is_none());
        Ok(())
    }

    #[test]
    fn wrong_secret_is_rejected() -> anyhow::Result<()> {
        let token = codec().create(&session())?;
        let other = SessionCodec::new(SecretString::from("other-secret"), 3600);
        assert!(other.verify(&token).is_none());
        Ok(())
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let codec = codec();
        assert!(codec.verify("").is_none());
        assert!(codec.verify("no-dot").is_none());
        assert!(codec.verify("a.b.c").is_none());
        assert!(codec.verify("!!!.???").is_none());
    }

    #[test]
    fn extract_token_prefers_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(
            COOKIE,
            HeaderValue::from_static("fieldpost_session=from-cookie"),
        );
        assert_eq!(extract_session_token(&headers), Some("abc".to_string()));
    }

    #[test]
    fn extract_token_reads_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; fieldpost_session=tok; lang=en"),
        );
        assert_eq!(extract_session_token(&headers), Some("tok".to_string()));
    }

    #[test]
    fn extract_token_none_when_missing() {
        assert_eq!(extract_session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn session_cookie_flags() -> anyhow::Result<()> {
        let cookie = session_cookie("tok", 60, true)?;
        let value = cookie.to_str()?;
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("Max-Age=60"));
        assert!(value.contains("Secure"));

        let cookie = session_cookie("tok", 60, false)?;
        assert!(!cookie.to_str()?.contains("Secure"));
        Ok(())
    }
}
