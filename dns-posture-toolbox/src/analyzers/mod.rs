//! Record analyzers: one per check kind.
//!
//! Every analyzer turns raw DNS answers into a [`CheckOutcome`] and never
//! returns an error. Resolver failures become `error` findings so that one
//! broken probe cannot keep the rest of a report from being scored.

mod dane;
mod dkim;
mod dmarc;
mod dnssec;
mod nameservers;
mod spf;
mod txt_policy;
mod zone_transfer;

use std::sync::Arc;

use async_trait::async_trait;

use crate::command::CommandRunner;
use crate::domain::Domain;
use crate::error::{ToolboxError, ToolboxResult};
use crate::resolver::DnsResolver;
use crate::types::{CheckKind, CheckOutcome, DnsQueryType, Finding, LookupOutcome};

pub use dane::DaneAnalyzer;
pub use dkim::{DEFAULT_DKIM_SELECTORS, DkimAnalyzer};
pub use dmarc::DmarcAnalyzer;
pub use dnssec::DnssecAnalyzer;
pub use nameservers::NameserversAnalyzer;
pub use spf::{SpfAnalyzer, SpfPolicy, parse_spf};
pub use txt_policy::TxtPolicyAnalyzer;
pub use zone_transfer::{ZoneTransferAnalyzer, ZoneTransferProbe};

/// A single posture check.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// The check this analyzer answers.
    fn kind(&self) -> CheckKind;

    /// Run the check. Must not panic on resolver failures.
    async fn analyze(&self, resolver: &dyn DnsResolver, domain: &Domain) -> CheckOutcome;
}

/// Inputs needed to build the analyzer set.
#[derive(Clone, Default)]
pub struct AnalyzerOptions {
    /// DKIM selectors to probe; empty means [`DEFAULT_DKIM_SELECTORS`].
    pub dkim_selectors: Vec<String>,
    /// AXFR probe; `None` leaves zone-transfer exposure unprobed.
    pub zone_transfer_probe: Option<ZoneTransferProbe>,
}

impl AnalyzerOptions {
    #[must_use]
    pub fn with_dkim_selectors(mut self, selectors: Vec<String>) -> Self {
        self.dkim_selectors = selectors;
        self
    }

    #[must_use]
    pub fn with_zone_transfer_probe(
        mut self,
        runner: Arc<dyn CommandRunner>,
        program: impl Into<String>,
    ) -> Self {
        self.zone_transfer_probe = Some(ZoneTransferProbe::new(runner, program));
        self
    }
}

/// Build the analyzer for `kind`, or `None` when the kind has no analyzer.
pub fn build_analyzer(kind: CheckKind, options: &AnalyzerOptions) -> Option<Arc<dyn Analyzer>> {
    let analyzer: Arc<dyn Analyzer> = match kind {
        CheckKind::Spf => Arc::new(SpfAnalyzer),
        CheckKind::Dmarc => Arc::new(DmarcAnalyzer),
        CheckKind::Dkim => {
            if options.dkim_selectors.is_empty() {
                Arc::new(DkimAnalyzer::default())
            } else {
                Arc::new(DkimAnalyzer::new(options.dkim_selectors.clone()))
            }
        }
        CheckKind::Bimi => Arc::new(TxtPolicyAnalyzer::bimi()),
        CheckKind::Dnssec => Arc::new(DnssecAnalyzer),
        CheckKind::ZoneTransfer => {
            Arc::new(ZoneTransferAnalyzer::new(options.zone_transfer_probe.clone()))
        }
        CheckKind::Nameservers => Arc::new(NameserversAnalyzer),
        CheckKind::Dane => Arc::new(DaneAnalyzer),
        CheckKind::TlsReport => Arc::new(TxtPolicyAnalyzer::tls_report()),
        CheckKind::MtaSts => Arc::new(TxtPolicyAnalyzer::mta_sts()),
        CheckKind::Smtp | CheckKind::Tls => return None,
    };
    Some(analyzer)
}

/// ASCII case-insensitive prefix test (`v=spf1`, `v=DMARC1`, ...).
pub(crate) fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// First TXT record at `name` whose text starts with `prefix`.
pub(crate) async fn find_txt_record(
    resolver: &dyn DnsResolver,
    name: &str,
    prefix: &str,
) -> ToolboxResult<Option<String>> {
    let outcome = resolver.lookup(name, DnsQueryType::Txt).await?;
    Ok(outcome
        .records()
        .iter()
        .map(|r| r.value.trim())
        .find(|text| starts_with_ignore_case(text, prefix))
        .map(ToString::to_string))
}

/// NS targets for `domain`, in resolver order.
pub(crate) async fn nameserver_names(
    resolver: &dyn DnsResolver,
    domain: &Domain,
) -> ToolboxResult<Vec<String>> {
    let outcome = resolver.lookup(domain.as_str(), DnsQueryType::Ns).await?;
    Ok(match outcome {
        LookupOutcome::Found(_) => outcome.values(),
        LookupOutcome::NotFound => Vec::new(),
    })
}

/// Log an unexpected resolver failure and produce the standard error finding.
pub(crate) fn check_failed(kind: CheckKind, domain: &Domain, err: &ToolboxError) -> Finding {
    log::warn!("[{kind}] check for {domain} failed: {err}");
    Finding::check_failed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_match_ignores_case() {
        assert!(starts_with_ignore_case("V=SPF1 -all", "v=spf1"));
        assert!(starts_with_ignore_case("v=DMARC1; p=none", "v=dmarc1"));
        assert!(!starts_with_ignore_case("v=spf", "v=spf1"));
        assert!(!starts_with_ignore_case("spf v=spf1", "v=spf1"));
    }

    #[test]
    fn every_supported_kind_has_an_analyzer() {
        let options = AnalyzerOptions::default();
        for kind in CheckKind::ALL {
            let analyzer = build_analyzer(kind, &options);
            assert_eq!(analyzer.is_some(), kind.is_supported(), "{kind}");
            if let Some(analyzer) = analyzer {
                assert_eq!(analyzer.kind(), kind);
            }
        }
    }
}
