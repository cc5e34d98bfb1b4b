//! HTTP handlers, grouped by surface.

use crate::api::error::ApiError;
use crate::auth::rate_limit::RateDecision;
use axum::http::HeaderMap;

pub mod auth;
pub mod health;
pub mod submissions;

/// Client address for rate limiting, taken from common proxy headers.
/// Falls back to a shared bucket when no header is present.
pub(crate) fn client_ip(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map_or_else(|| "unknown".to_string(), str::to_string)
}

/// Turn a failed limiter decision into the 429 error.
pub(crate) fn enforce(decision: RateDecision) -> Result<(), ApiError> {
    if decision.success {
        Ok(())
    } else {
        Err(ApiError::RateLimited {
            limit: decision.limit,
            remaining: decision.remaining,
            reset_unix_ms: decision.reset_unix_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn client_ip_prefers_forwarded() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 5.6.7.8"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(client_ip(&headers), "1.2.3.4");
    }

    #[test]
    fn client_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(client_ip(&headers), "9.9.9.9");
    }

    #[test]
    fn client_ip_unknown_when_missing() {
        assert_eq!(client_ip(&HeaderMap::new()), "unknown");
    }

    #[test]
    fn enforce_maps_failure_to_rate_limited() {
        let allowed = RateDecision {
            success: true,
            limit: 5,
            remaining: 4,
            reset_unix_ms: 0,
        };
        assert!(enforce(allowed).is_ok());

        let denied = RateDecision {
            success: false,
            limit: 5,
            remaining: 0,
            reset_unix_ms: 0,
        };
        assert!(matches!(
            enforce(denied),
            Err(ApiError::RateLimited { limit: 5, .. })
        ));
    }
}
