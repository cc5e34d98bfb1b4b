//! API error taxonomy. Guard failures carry a distinguishing header so the
//! frontend can tell the classes apart without the body leaking which
//! internal check tripped.

use crate::audit;
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No valid session.
    #[error("authentication required")]
    AuthenticationRequired,
    /// Authenticated, but the session role does not satisfy the gate.
    #[error("role not authorized")]
    RoleDenied,
    /// Authenticated, but neither owner nor in the allowed role set.
    #[error("access denied")]
    AccessDenied,
    #[error("automated requests are not allowed")]
    BotDenied,
    #[error("too many requests")]
    RateLimited {
        limit: u32,
        remaining: u32,
        reset_unix_ms: i64,
    },
    #[error("{0}")]
    Validation(String),
    #[error("not found")]
    NotFound,
    /// A required secret or credential is missing or malformed. The code is
    /// machine-readable so operators can act without reading logs.
    #[error("server configuration error: {code}")]
    Configuration { code: &'static str },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn body(message: &str) -> Json<serde_json::Value> {
        Json(json!({ "error": message }))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::AuthenticationRequired => {
                let mut response = (
                    StatusCode::UNAUTHORIZED,
                    Self::body("Authentication required"),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert("X-Auth-Required", HeaderValue::from_static("true"));
                response
            }
            Self::RoleDenied => {
                let mut response =
                    (StatusCode::FORBIDDEN, Self::body("Not authorized")).into_response();
                response
                    .headers_mut()
                    .insert("X-Authorization-Failed", HeaderValue::from_static("true"));
                response
            }
            Self::AccessDenied => {
                let mut response =
                    (StatusCode::FORBIDDEN, Self::body("Access denied")).into_response();
                response
                    .headers_mut()
                    .insert("X-Access-Denied", HeaderValue::from_static("true"));
                response
            }
            Self::BotDenied => (
                StatusCode::FORBIDDEN,
                Self::body("Automated requests are not allowed"),
            )
                .into_response(),
            Self::RateLimited {
                limit,
                remaining,
                reset_unix_ms,
            } => {
                let retry_after_seconds =
                    ((reset_unix_ms - Utc::now().timestamp_millis()).max(0) + 999) / 1000;
                let mut response =
                    (StatusCode::TOO_MANY_REQUESTS, Self::body("Too many requests"))
                        .into_response();
                let headers = response.headers_mut();
                for (name, value) in [
                    (RETRY_AFTER.as_str(), retry_after_seconds.to_string()),
                    ("x-ratelimit-limit", limit.to_string()),
                    ("x-ratelimit-remaining", remaining.to_string()),
                    ("x-ratelimit-reset", (reset_unix_ms / 1000).to_string()),
                ] {
                    if let Ok(value) = HeaderValue::from_str(&value) {
                        if let Ok(name) = name.parse::<axum::http::HeaderName>() {
                            headers.insert(name, value);
                        }
                    }
                }
                response
            }
            Self::Validation(message) => {
                (StatusCode::BAD_REQUEST, Self::body(&message)).into_response()
            }
            Self::NotFound => (StatusCode::NOT_FOUND, Self::body("Not found")).into_response(),
            Self::Configuration { code } => {
                audit::configuration_error(code);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Server configuration error", "code": code })),
                )
                    .into_response()
            }
            Self::Internal(err) => {
                error!("internal error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Self::body("Internal server error"),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_failures_carry_distinguishing_headers() {
        let response = ApiError::AuthenticationRequired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key("X-Auth-Required"));

        let response = ApiError::RoleDenied.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().contains_key("X-Authorization-Failed"));

        let response = ApiError::AccessDenied.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().contains_key("X-Access-Denied"));
    }

    #[test]
    fn bot_denied_has_no_guard_headers() {
        let response = ApiError::BotDenied.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(!response.headers().contains_key("X-Auth-Required"));
        assert!(!response.headers().contains_key("X-Authorization-Failed"));
        assert!(!response.headers().contains_key("X-Access-Denied"));
    }

    #[test]
    fn rate_limited_exposes_window_headers() {
        let response = ApiError::RateLimited {
            limit: 5,
            remaining: 0,
            reset_unix_ms: Utc::now().timestamp_millis() + 60_000,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(RETRY_AFTER));
        assert_eq!(
            response
                .headers()
                .get("x-ratelimit-limit")
                .and_then(|v| v.to_str().ok()),
            Some("5")
        );
        assert_eq!(
            response
                .headers()
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok()),
            Some("0")
        );
    }

    #[test]
    fn configuration_error_exposes_machine_code() {
        let response = ApiError::Configuration {
            code: "pro_password_hash_missing",
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
