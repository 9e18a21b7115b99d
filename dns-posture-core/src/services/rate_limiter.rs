//! Fixed-window request limiting per client.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::config::RateLimitConfig;
use crate::error::CoreResult;
use crate::traits::{CacheStore, Clock};
use crate::types::RateState;
use crate::utils::saturating_add;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    /// Denied until the window resets in `retry_after_secs`.
    Limited { retry_after_secs: u64 },
}

impl RateDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Counts requests per client in fixed windows stored in a [`CacheStore`].
///
/// State lives under `rate:<client>` with a TTL equal to what is left of the
/// window, so the store's lazy expiry also clears stale windows.
pub struct RateLimiter {
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    window: Duration,
    max_requests: u32,
    // Serializes read-modify-write so two requests cannot take the last slot.
    guard: Mutex<()>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CacheStore>, clock: Arc<dyn Clock>, config: &RateLimitConfig) -> Self {
        Self {
            store,
            clock,
            window: Duration::from_secs(config.window_secs),
            max_requests: config.max_requests,
            guard: Mutex::new(()),
        }
    }

    pub fn key(client_id: &str) -> String {
        format!("rate:{client_id}")
    }

    /// Count one request for `client_id` and report whether it may proceed.
    pub async fn allow(&self, client_id: &str) -> CoreResult<bool> {
        Ok(self.acquire(client_id).await?.is_allowed())
    }

    /// Like [`allow`](Self::allow) but says how long a denied client must wait.
    pub async fn acquire(&self, client_id: &str) -> CoreResult<RateDecision> {
        let _guard = self.guard.lock().await;
        let key = Self::key(client_id);
        let now = self.clock.now();

        let current = match self.store.get(&key).await? {
            Some(raw) => match serde_json::from_str::<RateState>(&raw) {
                Ok(state) if now < state.window_reset_at => Some(state),
                Ok(_) => None,
                Err(e) => {
                    log::warn!("[rate] discarding unreadable state for {client_id}: {e}");
                    None
                }
            },
            None => None,
        };

        let state = match current {
            None => RateState {
                count: 1,
                window_reset_at: saturating_add(now, self.window),
            },
            Some(state) if state.count < self.max_requests => RateState {
                count: state.count + 1,
                ..state
            },
            Some(state) => {
                let remaining = (state.window_reset_at - now).to_std().unwrap_or_default();
                let retry_after_secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
                log::info!(
                    "[rate] {client_id} over limit ({}/{}), retry in {retry_after_secs}s",
                    state.count,
                    self.max_requests
                );
                return Ok(RateDecision::Limited {
                    retry_after_secs: retry_after_secs.max(1),
                });
            }
        };

        let ttl = (state.window_reset_at - now).to_std().unwrap_or(self.window);
        self.store.set(&key, serde_json::to_string(&state)?, ttl).await?;
        Ok(RateDecision::Allowed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::traits::{InMemoryCacheStore, ManualClock};

    fn limiter(clock: &ManualClock, max_requests: u32, window_secs: u64) -> RateLimiter {
        let clock: Arc<dyn Clock> = Arc::new(clock.clone());
        let store = Arc::new(InMemoryCacheStore::with_clock(clock.clone()));
        RateLimiter::new(
            store,
            clock,
            &RateLimitConfig {
                window_secs,
                max_requests,
            },
        )
    }

    #[tokio::test]
    async fn fixed_window() {
        let clock = ManualClock::default();
        let limiter = limiter(&clock, 3, 60);

        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(limiter.allow("10.0.0.1").await.unwrap());
        }
        assert_eq!(seen, vec![true, true, true, false]);

        clock.advance(Duration::from_secs(60));
        assert!(limiter.allow("10.0.0.1").await.unwrap());
    }

    #[tokio::test]
    async fn clients_are_independent() {
        let clock = ManualClock::default();
        let limiter = limiter(&clock, 1, 60);
        assert!(limiter.allow("a").await.unwrap());
        assert!(!limiter.allow("a").await.unwrap());
        assert!(limiter.allow("b").await.unwrap());
    }

    #[tokio::test]
    async fn reports_retry_after() {
        let clock = ManualClock::default();
        let limiter = limiter(&clock, 1, 60);
        limiter.acquire("a").await.unwrap();
        clock.advance(Duration::from_millis(20_500));
        assert_eq!(
            limiter.acquire("a").await.unwrap(),
            RateDecision::Limited {
                retry_after_secs: 40
            }
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_share_the_limit() {
        let clock = ManualClock::default();
        let limiter = Arc::new(limiter(&clock, 5, 60));

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.allow("burst").await.unwrap() })
            })
            .collect();
        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 5);
    }
}
