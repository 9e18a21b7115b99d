//! Resolver adapter backed by hickory-resolver.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::{
    ResolveError, TokioResolver,
    config::{NameServerConfigGroup, ResolverConfig, ResolverOpts},
    name_server::TokioConnectionProvider,
    proto::{
        ProtoErrorKind,
        rr::{RData, RecordType},
    },
};

use super::{DnsResolver, normalize_name, retry_transient};
use crate::error::{ToolboxError, ToolboxResult};
use crate::types::{DnsLookupRecord, DnsQueryType, LookupOutcome};

/// Queries DNS through hickory with a per-attempt timeout and bounded retries.
///
/// Hickory's own answer cache and retry loop are disabled: retries are driven
/// by [`retry_transient`] so that "no such record" is never retried, and
/// caching happens one level up on whole check reports.
pub struct HickoryDnsResolver {
    resolver: TokioResolver,
    timeout: Duration,
    max_retries: u32,
}

impl HickoryDnsResolver {
    /// Resolver using the host system DNS configuration.
    ///
    /// On Unix/Windows this reads e.g. `/etc/resolv.conf`; if that fails it falls
    /// back to Hickory's default upstream set.
    pub fn new(timeout: Duration, max_retries: u32) -> Self {
        Self {
            resolver: build_system_resolver(timeout),
            timeout,
            max_retries,
        }
    }

    /// Resolver that sends every query to one nameserver IP.
    pub fn with_nameserver(ns_ip: IpAddr, timeout: Duration, max_retries: u32) -> Self {
        let config = ResolverConfig::from_parts(
            None,
            vec![],
            NameServerConfigGroup::from_ips_clear(&[ns_ip], 53, true),
        );
        let provider = TokioConnectionProvider::default();
        let resolver = TokioResolver::builder_with_config(config, provider)
            .with_options(resolver_opts(timeout))
            .build();
        Self {
            resolver,
            timeout,
            max_retries,
        }
    }

    async fn lookup_once(&self, name: &str, record_type: DnsQueryType) -> ToolboxResult<LookupOutcome> {
        let fqdn = format!("{name}.");
        let wanted = to_record_type(record_type);

        let response = match tokio::time::timeout(self.timeout, self.resolver.lookup(fqdn.as_str(), wanted)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return classify_error(name, record_type, &e),
            Err(_) => {
                return Err(ToolboxError::Timeout(format!(
                    "{record_type} lookup for {name} timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        let records: Vec<DnsLookupRecord> = response
            .record_iter()
            .filter(|record| record.record_type() == wanted)
            .map(|record| DnsLookupRecord {
                record_type,
                name: normalize_name(&record.name().to_string()),
                value: record_value(record.data()),
                ttl: record.ttl(),
            })
            .collect();

        log::debug!("[dns] {record_type} {name}: {} record(s)", records.len());

        if records.is_empty() {
            Ok(LookupOutcome::NotFound)
        } else {
            Ok(LookupOutcome::Found(records))
        }
    }
}

#[async_trait]
impl DnsResolver for HickoryDnsResolver {
    async fn lookup(&self, name: &str, record_type: DnsQueryType) -> ToolboxResult<LookupOutcome> {
        let name = normalize_name(name);
        let label = format!("{record_type} {name}");
        retry_transient(&label, self.max_retries, || self.lookup_once(&name, record_type)).await
    }
}

/// Options shared by every resolver this module builds.
fn resolver_opts(timeout: Duration) -> ResolverOpts {
    let mut opts = ResolverOpts::default();
    opts.timeout = timeout;
    opts.attempts = 1;
    opts.cache_size = 0;
    opts
}

/// Build a resolver using the host system DNS configuration (with fallback).
fn build_system_resolver(timeout: Duration) -> TokioResolver {
    #[cfg(any(unix, target_os = "windows"))]
    {
        match TokioResolver::builder_tokio() {
            Ok(mut builder) => {
                *builder.options_mut() = resolver_opts(timeout);
                return builder.build();
            }
            Err(e) => {
                log::warn!(
                    "Failed to load system DNS configuration, falling back to defaults: {e}"
                );
            }
        }
    }

    let provider = TokioConnectionProvider::default();
    TokioResolver::builder_with_config(ResolverConfig::default(), provider)
        .with_options(resolver_opts(timeout))
        .build()
}

fn to_record_type(record_type: DnsQueryType) -> RecordType {
    match record_type {
        DnsQueryType::A => RecordType::A,
        DnsQueryType::Txt => RecordType::TXT,
        DnsQueryType::Ns => RecordType::NS,
        DnsQueryType::Dnskey => RecordType::DNSKEY,
        DnsQueryType::Ds => RecordType::DS,
        DnsQueryType::Soa => RecordType::SOA,
        DnsQueryType::Mx => RecordType::MX,
        DnsQueryType::Tlsa => RecordType::TLSA,
    }
}

/// Map a hickory error onto the tri-state contract.
fn classify_error(
    name: &str,
    record_type: DnsQueryType,
    err: &ResolveError,
) -> ToolboxResult<LookupOutcome> {
    if err.is_no_records_found() || err.is_nx_domain() {
        return Ok(LookupOutcome::NotFound);
    }
    let timed_out = err
        .proto()
        .is_some_and(|proto| matches!(proto.kind(), ProtoErrorKind::Timeout));
    if timed_out {
        Err(ToolboxError::Timeout(format!(
            "{record_type} lookup for {name} timed out: {err}"
        )))
    } else {
        Err(ToolboxError::NetworkError(format!(
            "{record_type} lookup for {name} failed: {err}"
        )))
    }
}

/// Render record data the way analyzers compare it.
fn record_value(data: &RData) -> String {
    match data {
        RData::TXT(txt) => txt
            .iter()
            .map(|data| String::from_utf8_lossy(data).to_string())
            .collect::<String>(),
        RData::NS(ns) => ns.0.to_string().trim_end_matches('.').to_string(),
        RData::MX(mx) => mx.exchange().to_string().trim_end_matches('.').to_string(),
        other => other.to_string(),
    }
}
