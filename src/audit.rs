//! Security event log. Everything here lands under `target: "audit"` so
//! operators can route it separately from application noise.

use uuid::Uuid;

pub fn auth_success(email: &str, role: &str, ip: &str) {
    tracing::info!(target: "audit", event = "auth_success", email, role, ip);
}

pub fn auth_failure(reason: &str, ip: &str) {
    tracing::warn!(target: "audit", event = "auth_failure", reason, ip);
}

pub fn authorization_denied(email: &str, role: &str, path: &str) {
    tracing::warn!(target: "audit", event = "authorization_denied", email, role, path);
}

/// A caller reached for a submission they neither own nor may review.
pub fn access_denied(email: &str, submission_id: Uuid, ip: &str) {
    tracing::warn!(
        target: "audit",
        event = "access_denied",
        email,
        submission_id = %submission_id,
        ip
    );
}

pub fn bot_denied(ip: &str, path: &str) {
    tracing::warn!(target: "audit", event = "bot_denied", ip, path);
}

pub fn rate_limited(identifier: &str, limit: u32) {
    tracing::warn!(target: "audit", event = "rate_limited", identifier, limit);
}

/// Production has no durable rate-limit backend (or it failed); requests are
/// being denied until it recovers. This one pages.
pub fn rate_limit_fail_closed(identifier: &str) {
    tracing::error!(
        target: "audit",
        event = "rate_limit_fail_closed",
        identifier,
        "rate limit backend unavailable in production, denying request"
    );
}

pub fn submission_event(event: &str, submission_id: Uuid, email: &str) {
    tracing::info!(
        target: "audit",
        event,
        submission_id = %submission_id,
        email
    );
}

pub fn publish_result(submission_id: Uuid, platform: &str, success: bool) {
    if success {
        tracing::info!(
            target: "audit",
            event = "publish_result",
            submission_id = %submission_id,
            platform,
            success
        );
    } else {
        tracing::warn!(
            target: "audit",
            event = "publish_result",
            submission_id = %submission_id,
            platform,
            success
        );
    }
}

pub fn configuration_error(code: &str) {
    tracing::error!(target: "audit", event = "configuration_error", code);
}
