//! Role and ownership guards.
//!
//! Every protected handler funnels through these three checks. They return
//! a verified [`Session`] on success and a typed error on failure, so a
//! caller is forced to handle both branches.

use super::session::{Session, SessionCodec, extract_session_token};
use crate::api::error::ApiError;
use crate::audit;
use crate::domain::Role;
use axum::http::HeaderMap;

/// What a submission-scoped operation allows beyond the owner.
#[derive(Clone, Copy, Debug)]
pub enum SubmissionAccess {
    OwnerOnly,
    OwnerOr(&'static [Role]),
}

/// Exact-match role check. `pro` and `leader` are parallel; neither
/// satisfies the other, and elevated access is always granted through an
/// explicit allowed-role set on the operation.
#[must_use]
pub fn has_role(session: &Session, role: Role) -> bool {
    session.role == role
}

/// Require a valid session.
///
/// # Errors
/// `AuthenticationRequired` when the token is missing, tampered, or expired.
pub fn require_auth(codec: &SessionCodec, headers: &HeaderMap) -> Result<Session, ApiError> {
    extract_session_token(headers)
        .and_then(|token| codec.verify(&token))
        .ok_or(ApiError::AuthenticationRequired)
}

/// Require a valid session holding exactly `role`.
///
/// # Errors
/// `AuthenticationRequired` without a session, `RoleDenied` with the wrong
/// role.
pub fn require_role(
    codec: &SessionCodec,
    headers: &HeaderMap,
    role: Role,
) -> Result<Session, ApiError> {
    let session = require_auth(codec, headers)?;
    if has_role(&session, role) {
        Ok(session)
    } else {
        audit::authorization_denied(&session.email, session.role.as_str(), role.as_str());
        Err(ApiError::RoleDenied)
    }
}

/// Ownership-aware access check for submission-scoped operations.
///
/// The owner always passes regardless of role. Everyone else passes only
/// when the descriptor lists their role.
///
/// # Errors
/// `AuthenticationRequired` without a session, `AccessDenied` otherwise.
pub fn check_submission_access(
    codec: &SessionCodec,
    headers: &HeaderMap,
    owner_email: &str,
    access: SubmissionAccess,
) -> Result<Session, ApiError> {
    let session = require_auth(codec, headers)?;
    if session.email == owner_email {
        return Ok(session);
    }
    let allowed = match access {
        SubmissionAccess::OwnerOnly => false,
        SubmissionAccess::OwnerOr(roles) => roles.contains(&session.role),
    };
    if allowed {
        Ok(session)
    } else {
        audit::authorization_denied(&session.email, session.role.as_str(), "submission");
        Err(ApiError::AccessDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum::http::header::COOKIE;
    use secrecy::SecretString;

    fn codec() -> SessionCodec {
        SessionCodec::new(SecretString::from("guard-secret"), 3600)
    }

    fn headers_for(codec: &SessionCodec, email: &str, role: Role) -> HeaderMap {
        let session = Session {
            email: email.to_string(),
            role,
            submission_id: None,
        };
        let token = codec.create(&session).unwrap_or_default();
        let mut headers = HeaderMap::new();
        let cookie = format!("fieldpost_session={token}");
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            headers.insert(COOKIE, value);
        }
        headers
    }

    #[test]
    fn require_auth_without_token() {
        let result = require_auth(&codec(), &HeaderMap::new());
        assert!(matches!(result, Err(ApiError::AuthenticationRequired)));
    }

    #[test]
    fn require_auth_with_valid_token() {
        let codec = codec();
        let headers = headers_for(&codec, "alice@example.com", Role::TeamMember);
        let session = require_auth(&codec, &headers);
        assert_eq!(session.map(|s| s.email).ok().as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn require_role_is_exact_match() {
        let codec = codec();
        let leader = headers_for(&codec, "lead@example.com", Role::Leader);
        assert!(require_role(&codec, &leader, Role::Leader).is_ok());
        // leader does not satisfy a pro gate, and vice versa
        assert!(matches!(
            require_role(&codec, &leader, Role::Pro),
            Err(ApiError::RoleDenied)
        ));
        let pro = headers_for(&codec, "pro@example.com", Role::Pro);
        assert!(matches!(
            require_role(&codec, &pro, Role::Leader),
            Err(ApiError::RoleDenied)
        ));
    }

    #[test]
    fn require_role_without_session_is_unauthenticated() {
        let result = require_role(&codec(), &HeaderMap::new(), Role::Pro);
        assert!(matches!(result, Err(ApiError::AuthenticationRequired)));
    }

    const OWNER: &str = "owner@example.com";

    fn access_allowed(role: Role, email: &str, access: SubmissionAccess) -> bool {
        let codec = codec();
        let headers = headers_for(&codec, email, role);
        check_submission_access(&codec, &headers, OWNER, access).is_ok()
    }

    #[test]
    fn ownership_table_owner_only() {
        // owner passes with any role; everyone else is denied
        for role in [Role::TeamMember, Role::Pro, Role::Leader] {
            assert!(access_allowed(role, OWNER, SubmissionAccess::OwnerOnly));
            assert!(!access_allowed(
                role,
                "other@example.com",
                SubmissionAccess::OwnerOnly
            ));
        }
    }

    #[test]
    fn ownership_table_owner_or_reviewers() {
        const REVIEWERS: SubmissionAccess = SubmissionAccess::OwnerOr(&[Role::Pro, Role::Leader]);
        for role in [Role::TeamMember, Role::Pro, Role::Leader] {
            assert!(access_allowed(role, OWNER, REVIEWERS));
        }
        assert!(!access_allowed(Role::TeamMember, "other@example.com", REVIEWERS));
        assert!(access_allowed(Role::Pro, "pro@example.com", REVIEWERS));
        assert!(access_allowed(Role::Leader, "lead@example.com", REVIEWERS));
    }

    #[test]
    fn ownership_check_without_session_is_unauthenticated() {
        let result = check_submission_access(
            &codec(),
            &HeaderMap::new(),
            OWNER,
            SubmissionAccess::OwnerOnly,
        );
        assert!(matches!(result, Err(ApiError::AuthenticationRequired)));
    }
}
