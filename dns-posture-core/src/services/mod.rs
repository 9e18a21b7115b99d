//! Business logic service layer

mod check_service;
mod rate_limiter;
pub mod scorer;

pub use check_service::CheckService;
pub use rate_limiter::{RateDecision, RateLimiter};
pub use scorer::ScoreCard;

use std::sync::Arc;

use dns_posture_toolbox::{DnsResolver, HickoryDnsResolver};

use crate::config::CheckConfig;
use crate::error::CoreResult;
use crate::storage::FileCacheStore;
use crate::traits::{CacheStore, Clock, InMemoryCacheStore, SystemClock};

/// Service context - holds all dependencies
///
/// The platform layer creates this context and injects the resolver, cache
/// store and clock it wants the services to use.
pub struct ServiceContext {
    /// DNS lookups
    pub resolver: Arc<dyn DnsResolver>,
    /// Report cache and rate-limit state
    pub cache: Arc<dyn CacheStore>,
    /// Time source
    pub clock: Arc<dyn Clock>,
}

impl ServiceContext {
    #[must_use]
    pub fn new(
        resolver: Arc<dyn DnsResolver>,
        cache: Arc<dyn CacheStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            resolver,
            cache,
            clock,
        }
    }

    /// Production wiring: system (or configured) resolver, system clock, and a file cache when
    /// `cache.dir` is set (in-memory otherwise).
    pub async fn from_config(config: &CheckConfig) -> CoreResult<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let resolver = Arc::new(match config.nameserver {
            Some(ip) => {
                log::info!("[dns] sending queries to {ip}");
                HickoryDnsResolver::with_nameserver(ip, config.dns_timeout(), config.dns_retries)
            }
            None => HickoryDnsResolver::new(config.dns_timeout(), config.dns_retries),
        });
        let cache: Arc<dyn CacheStore> = match &config.cache.dir {
            Some(dir) => {
                log::info!("[cache] storing reports under {}", dir.display());
                Arc::new(FileCacheStore::open_with_clock(dir, clock.clone()).await?)
            }
            None => Arc::new(InMemoryCacheStore::with_clock(clock.clone())),
        };
        Ok(Self::new(resolver, cache, clock))
    }
}
