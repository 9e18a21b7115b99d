//! Test helper module
//!
//! Mock implementations and fixture factories.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dns_posture_toolbox::{
    Analyzer, CheckKind, CheckOutcome, DnsQueryType, DnsResolver, Domain, Finding, LookupOutcome,
    StaticResolver, ToolboxResult,
};
use tokio::sync::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::traits::{CacheStore, InMemoryCacheStore, ManualClock};

// ===== Fixtures =====

/// A fixed instant so reports are reproducible.
pub fn start_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-01-15T08:30:00Z")
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

/// A domain with sound mail authentication but no DNSSEC.
pub fn well_configured_resolver() -> StaticResolver {
    StaticResolver::new()
        .with_records(
            "example.com",
            DnsQueryType::Txt,
            ["google-site-verification=abc", "v=spf1 include:_spf.example.com -all"],
        )
        .with_records("_dmarc.example.com", DnsQueryType::Txt, ["v=DMARC1; p=reject"])
        .with_records(
            "google._domainkey.example.com",
            DnsQueryType::Txt,
            ["v=DKIM1; k=rsa; p=MIIBIjANBgkq"],
        )
        .with_records("example.com", DnsQueryType::Ns, ["ns1.example.net", "ns2.example.net"])
        .with_records("example.com", DnsQueryType::Mx, ["mx1.example.com"])
}

/// Context over `resolver` with an in-memory cache and a manual clock.
pub fn context(resolver: Arc<dyn DnsResolver>, clock: &ManualClock) -> Arc<ServiceContext> {
    let clock = Arc::new(clock.clone());
    Arc::new(ServiceContext::new(
        resolver,
        Arc::new(InMemoryCacheStore::with_clock(clock.clone())),
        clock,
    ))
}

// ===== PeakTrackingResolver =====

/// Delays every lookup and remembers how many were in flight at once.
pub struct PeakTrackingResolver {
    inner: StaticResolver,
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl PeakTrackingResolver {
    pub fn new(inner: StaticResolver, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DnsResolver for PeakTrackingResolver {
    async fn lookup(&self, name: &str, record_type: DnsQueryType) -> ToolboxResult<LookupOutcome> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        let outcome = self.inner.lookup(name, record_type).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

// ===== MockCacheStore =====

/// In-memory store whose writes can be made to fail.
pub struct MockCacheStore {
    inner: InMemoryCacheStore,
    set_error: RwLock<Option<String>>,
}

impl MockCacheStore {
    pub fn new(clock: &ManualClock) -> Self {
        Self {
            inner: InMemoryCacheStore::with_clock(Arc::new(clock.clone())),
            set_error: RwLock::new(None),
        }
    }

    pub async fn set_write_error(&self, err: Option<String>) {
        *self.set_error.write().await = err;
    }

    pub async fn len(&self) -> usize {
        self.inner.len().await
    }
}

#[async_trait]
impl CacheStore for MockCacheStore {
    async fn get(&self, key: &str) -> CoreResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CoreResult<()> {
        if let Some(ref msg) = *self.set_error.read().await {
            return Err(CoreError::CacheError(msg.clone()));
        }
        self.inner.set(key, value, ttl).await
    }

    async fn remove(&self, key: &str) -> CoreResult<()> {
        self.inner.remove(key).await
    }
}

// ===== Mock analyzers =====

/// Analyzer that panics instead of answering.
pub struct PanickingAnalyzer(pub CheckKind);

#[async_trait]
impl Analyzer for PanickingAnalyzer {
    fn kind(&self) -> CheckKind {
        self.0
    }

    #[allow(clippy::panic)]
    async fn analyze(&self, _resolver: &dyn DnsResolver, domain: &Domain) -> CheckOutcome {
        panic!("analyzer blew up on {domain}");
    }
}

/// Analyzer that answers `good` after sleeping.
pub struct SlowAnalyzer {
    pub kind: CheckKind,
    pub delay: Duration,
}

#[async_trait]
impl Analyzer for SlowAnalyzer {
    fn kind(&self) -> CheckKind {
        self.kind
    }

    async fn analyze(&self, _resolver: &dyn DnsResolver, _domain: &Domain) -> CheckOutcome {
        tokio::time::sleep(self.delay).await;
        Finding::good().into()
    }
}
