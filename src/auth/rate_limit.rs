//! Fixed-window rate limiting.
//!
//! The limiter is a constructed instance injected through application
//! state; there is no global. Counting happens behind [`RateLimitStore`] so
//! production uses one atomic Postgres upsert while development and tests
//! run on the in-memory store. Without a durable backend the policy splits:
//! development fails open, production fails closed.

use crate::audit;
use crate::config::Environment;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Clone, Copy, Debug)]
pub struct Quota {
    pub max: u32,
    pub window_seconds: i64,
}

impl Quota {
    #[must_use]
    pub const fn new(max: u32, window_seconds: i64) -> Self {
        Self {
            max,
            window_seconds,
        }
    }
}

/// Counter state for one identifier within the current window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub count: u32,
    pub reset_unix_ms: i64,
}

#[derive(Clone, Copy, Debug)]
pub struct RateDecision {
    pub success: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_unix_ms: i64,
}

/// Durable counter backend. `hit` increments the identifier's counter,
/// starting a fresh window when the previous one has expired, and must be
/// atomic per identifier.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn hit(&self, identifier: &str, window_ms: i64, now_ms: i64) -> Result<WindowSnapshot>;
}

/// Single-process fallback for development and tests. Counts are lost on
/// restart and not shared between instances.
#[derive(Default)]
pub struct MemoryRateLimitStore {
    entries: Mutex<HashMap<String, WindowSnapshot>>,
}

impl MemoryRateLimitStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn hit(&self, identifier: &str, window_ms: i64, now_ms: i64) -> Result<WindowSnapshot> {
        let mut entries = self.entries.lock().await;
        let snapshot = match entries.get(identifier) {
            Some(existing) if existing.reset_unix_ms > now_ms => WindowSnapshot {
                count: existing.count.saturating_add(1),
                reset_unix_ms: existing.reset_unix_ms,
            },
            _ => WindowSnapshot {
                count: 1,
                reset_unix_ms: now_ms + window_ms,
            },
        };
        entries.insert(identifier.to_string(), snapshot);
        Ok(snapshot)
    }
}

pub struct RateLimiter {
    store: Option<Arc<dyn RateLimitStore>>,
    fallback: MemoryRateLimitStore,
    environment: Environment,
}

impl RateLimiter {
    #[must_use]
    pub fn new(store: Option<Arc<dyn RateLimitStore>>, environment: Environment) -> Self {
        Self {
            store,
            fallback: MemoryRateLimitStore::new(),
            environment,
        }
    }

    /// Limit by client address, under the `ip:` scope.
    pub async fn limit_ip(&self, ip: &str, quota: Quota) -> RateDecision {
        self.check(&format!("ip:{ip}"), quota).await
    }

    /// Limit by authenticated identity, under the `id:` scope.
    pub async fn limit_identifier(&self, identifier: &str, quota: Quota) -> RateDecision {
        self.check(&format!("id:{identifier}"), quota).await
    }

    async fn check(&self, key: &str, quota: Quota) -> RateDecision {
        let now_ms = Utc::now().timestamp_millis();
        let window_ms = quota.window_seconds.saturating_mul(1000);

        let result = match &self.store {
            Some(store) => store.hit(key, window_ms, now_ms).await,
            None if self.environment.is_production() => {
                // No durable backend in production: deny rather than let an
                // outage disable throttling on auth endpoints.
                audit::rate_limit_fail_closed(key);
                return Self::closed(quota, now_ms + window_ms);
            }
            None => self.fallback.hit(key, window_ms, now_ms).await,
        };

        match result {
            Ok(snapshot) => {
                let decision = Self::from_snapshot(quota, snapshot);
                if !decision.success {
                    audit::rate_limited(key, quota.max);
                }
                decision
            }
            Err(err) if self.environment.is_production() => {
                warn!("rate limit store error: {err:#}");
                audit::rate_limit_fail_closed(key);
                Self::closed(quota, now_ms + window_ms)
            }
            Err(err) => {
                warn!("rate limit store error, failing open: {err:#}");
                RateDecision {
                    success: true,
                    limit: quota.max,
                    remaining: quota.max,
                    reset_unix_ms: now_ms + window_ms,
                }
            }
        }
    }

    fn from_snapshot(quota: Quota, snapshot: WindowSnapshot) -> RateDecision {
        RateDecision {
            success: snapshot.count <= quota.max,
            limit: quota.max,
            remaining: quota.max.saturating_sub(snapshot.count),
            reset_unix_ms: snapshot.reset_unix_ms,
        }
    }

    const fn closed(quota: Quota, reset_unix_ms: i64) -> RateDecision {
        RateDecision {
            success: false,
            limit: quota.max,
            remaining: 0,
            reset_unix_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct FailingStore;

    #[async_trait]
    impl RateLimitStore for FailingStore {
        async fn hit(&self, _: &str, _: i64, _: i64) -> Result<WindowSnapshot> {
            Err(anyhow!("backend down"))
        }
    }

    #[tokio::test]
    async fn window_counts_down_then_blocks() {
        let limiter = RateLimiter::new(None, Environment::Development);
        let quota = Quota::new(3, 900);

        let first = limiter.limit_ip("1.2.3.4", quota).await;
        assert!(first.success);
        assert_eq!(first.remaining, 2);

        let second = limiter.limit_ip("1.2.3.4", quota).await;
        assert!(second.success);
        assert_eq!(second.remaining, 1);

        let third = limiter.limit_ip("1.2.3.4", quota).await;
        assert!(third.success);
        assert_eq!(third.remaining, 0);

        let fourth = limiter.limit_ip("1.2.3.4", quota).await;
        assert!(!fourth.success);
        assert_eq!(fourth.remaining, 0);
        assert_eq!(fourth.limit, 3);
    }

    #[tokio::test]
    async fn scopes_are_independent() {
        let limiter = RateLimiter::new(None, Environment::Development);
        let quota = Quota::new(1, 900);

        assert!(limiter.limit_ip("1.2.3.4", quota).await.success);
        assert!(!limiter.limit_ip("1.2.3.4", quota).await.success);
        // same value under the id: scope is a different counter
        assert!(limiter.limit_identifier("1.2.3.4", quota).await.success);
        // and a different ip is untouched
        assert!(limiter.limit_ip("5.6.7.8", quota).await.success);
    }

    #[tokio::test]
    async fn expired_window_starts_fresh() -> Result<()> {
        let store = MemoryRateLimitStore::new();
        let window_ms = 900_000;

        let first = store.hit("ip:1.2.3.4", window_ms, 0).await?;
        assert_eq!(first.count, 1);
        let second = store.hit("ip:1.2.3.4", window_ms, 1).await?;
        assert_eq!(second.count, 2);
        assert_eq!(second.reset_unix_ms, window_ms);

        // past the reset boundary the counter restarts
        let fresh = store.hit("ip:1.2.3.4", window_ms, window_ms).await?;
        assert_eq!(fresh.count, 1);
        assert_eq!(fresh.reset_unix_ms, 2 * window_ms);
        Ok(())
    }

    #[tokio::test]
    async fn counter_increments_past_the_limit() -> Result<()> {
        let store = MemoryRateLimitStore::new();
        for expected in 1..=5 {
            let snapshot = store.hit("id:user@example.com", 900_000, 0).await?;
            assert_eq!(snapshot.count, expected);
        }
        Ok(())
    }

    #[tokio::test]
    async fn production_without_backend_fails_closed_immediately() {
        let limiter = RateLimiter::new(None, Environment::Production);
        let decision = limiter.limit_ip("1.2.3.4", Quota::new(100, 900)).await;
        assert!(!decision.success);
        assert_eq!(decision.remaining, 0);
    }

    #[tokio::test]
    async fn production_store_error_fails_closed() {
        let limiter = RateLimiter::new(Some(Arc::new(FailingStore)), Environment::Production);
        let decision = limiter.limit_ip("1.2.3.4", Quota::new(100, 900)).await;
        assert!(!decision.success);
    }

    #[tokio::test]
    async fn development_store_error_fails_open() {
        let limiter = RateLimiter::new(Some(Arc::new(FailingStore)), Environment::Development);
        let decision = limiter.limit_ip("1.2.3.4", Quota::new(2, 900)).await;
        assert!(decision.success);
        assert_eq!(decision.remaining, 2);
    }
}
