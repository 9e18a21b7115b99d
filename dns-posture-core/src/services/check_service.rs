//! Check orchestration: validate, serve from cache, fan out analyzers, score.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use dns_posture_toolbox::{
    Analyzer, AnalyzerOptions, BoundedResolver, CheckKind, CheckOutcome, DnsResolver, Domain,
    Finding, SandboxedCommandRunner, build_analyzer,
};
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout_at};

use super::rate_limiter::{RateDecision, RateLimiter};
use super::{ServiceContext, scorer};
use crate::config::CheckConfig;
use crate::error::{CoreError, CoreResult};
use crate::types::CheckReport;

/// Check service
pub struct CheckService {
    ctx: Arc<ServiceContext>,
    analyzers: Vec<Arc<dyn Analyzer>>,
    rate_limiter: RateLimiter,
    cache_ttl: Duration,
    deadline: Duration,
    max_queries: usize,
}

impl CheckService {
    /// Validate `config` and build the analyzer set it enables.
    pub fn new(ctx: Arc<ServiceContext>, config: &CheckConfig) -> CoreResult<Self> {
        config.validate()?;

        let mut options = AnalyzerOptions::default().with_dkim_selectors(config.dkim_selectors.clone());
        let zt = &config.zone_transfer;
        if zt.enabled {
            let runner = SandboxedCommandRunner::new(
                zt.allowed_programs.clone(),
                Duration::from_secs(zt.timeout_secs),
                zt.max_output_bytes,
            );
            runner.check_program(&zt.program)?;
            options = options.with_zone_transfer_probe(Arc::new(runner), zt.program.clone());
        }

        let analyzers = config
            .enabled_checks()
            .into_iter()
            .filter_map(|kind| build_analyzer(kind, &options))
            .collect();
        Ok(Self::with_analyzers(ctx, config, analyzers))
    }

    /// Use a caller-supplied analyzer set instead of the configured one.
    pub fn with_analyzers(
        ctx: Arc<ServiceContext>,
        config: &CheckConfig,
        mut analyzers: Vec<Arc<dyn Analyzer>>,
    ) -> Self {
        analyzers.sort_by_key(|a| a.kind());
        analyzers.dedup_by_key(|a| a.kind());
        let rate_limiter = RateLimiter::new(ctx.cache.clone(), ctx.clock.clone(), &config.rate_limit);
        Self {
            ctx,
            analyzers,
            rate_limiter,
            cache_ttl: config.cache_ttl(),
            deadline: config.request_deadline(),
            max_queries: config.max_concurrent_queries,
        }
    }

    /// Checks this service runs, in declaration order.
    pub fn kinds(&self) -> Vec<CheckKind> {
        self.analyzers.iter().map(|a| a.kind()).collect()
    }

    /// `report:<domain>:<kind,kind,...>`.
    pub fn cache_key(domain: &Domain, kinds: &[CheckKind]) -> String {
        let kinds: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
        format!("report:{domain}:{}", kinds.join(","))
    }

    /// Rate-limited entry point for external clients.
    pub async fn check_for_client(&self, client_id: &str, domain_text: &str) -> CoreResult<CheckReport> {
        match self.rate_limiter.acquire(client_id).await? {
            RateDecision::Allowed => self.check_all(domain_text).await,
            RateDecision::Limited { retry_after_secs } => Err(CoreError::RateLimitExceeded {
                client_id: client_id.to_string(),
                retry_after_secs,
            }),
        }
    }

    /// Produce (or serve from cache) the report for `domain_text`.
    pub async fn check_all(&self, domain_text: &str) -> CoreResult<CheckReport> {
        let domain = Domain::parse(domain_text)?;
        let key = Self::cache_key(&domain, &self.kinds());

        if let Some(report) = self.cached_report(&key).await? {
            log::info!("[check] cache hit for {domain}");
            return Ok(report);
        }
        log::info!("[check] cache miss for {domain}, running {} checks", self.analyzers.len());

        let findings = self.run_analyzers(&domain).await;
        let card = scorer::score(&findings);
        let report = CheckReport {
            domain: domain.to_string(),
            checked_at: self.ctx.clock.now(),
            findings,
            overall_score: card.score,
            strengths: card.strengths,
            improvements: card.improvements,
            risks: card.risks,
        };

        let body = serde_json::to_string(&report)?;
        if let Err(e) = self.ctx.cache.set(&key, body, self.cache_ttl).await {
            log::error!("[check] failed to cache report for {domain}: {e}");
        }

        log::info!("[check] {domain} scored {:.2}", report.overall_score);
        Ok(report)
    }

    async fn cached_report(&self, key: &str) -> CoreResult<Option<CheckReport>> {
        let raw = match self.ctx.cache.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(None),
            Err(e) => {
                log::error!("[check] cache read failed for {key}: {e}");
                return Ok(None);
            }
        };
        match serde_json::from_str(&raw) {
            Ok(report) => Ok(Some(report)),
            Err(e) => {
                log::warn!("[check] dropping corrupt cache entry {key}: {e}");
                if let Err(e) = self.ctx.cache.remove(key).await {
                    log::error!("[check] failed to remove {key}: {e}");
                }
                Ok(None)
            }
        }
    }

    /// Run every analyzer as its own task under one shared deadline and one
    /// shared lookup budget.
    async fn run_analyzers(&self, domain: &Domain) -> BTreeMap<CheckKind, CheckOutcome> {
        let deadline = Instant::now() + self.deadline;
        let resolver: Arc<dyn DnsResolver> =
            Arc::new(BoundedResolver::new(self.ctx.resolver.clone(), self.max_queries));

        let tasks: Vec<(CheckKind, JoinHandle<CheckOutcome>)> = self
            .analyzers
            .iter()
            .map(|analyzer| {
                let kind = analyzer.kind();
                let analyzer = analyzer.clone();
                let resolver = resolver.clone();
                let domain = domain.clone();
                let handle =
                    tokio::spawn(async move { analyzer.analyze(resolver.as_ref(), &domain).await });
                (kind, handle)
            })
            .collect();

        let mut findings = BTreeMap::new();
        for (kind, mut handle) in tasks {
            let outcome = match timeout_at(deadline, &mut handle).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(e)) => {
                    log::error!("[check] {kind} task for {domain} failed: {e}");
                    Finding::check_failed().into()
                }
                Err(_) => {
                    handle.abort();
                    log::warn!("[check] {kind} for {domain} missed the deadline");
                    Finding::error("Check timed out").into()
                }
            };
            findings.insert(kind, outcome);
        }
        findings
    }
}
