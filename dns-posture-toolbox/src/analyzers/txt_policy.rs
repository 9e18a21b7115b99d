//! Presence checks for single TXT policy records (BIMI, MTA-STS, TLS-RPT).

use async_trait::async_trait;

use super::{Analyzer, check_failed, find_txt_record};
use crate::domain::Domain;
use crate::resolver::DnsResolver;
use crate::types::{CheckKind, CheckOutcome, Finding};

/// Looks for a TXT record with a version tag under a fixed label.
pub struct TxtPolicyAnalyzer {
    kind: CheckKind,
    label: &'static str,
    version_tag: &'static str,
    name: &'static str,
}

impl TxtPolicyAnalyzer {
    /// BIMI: `default._bimi.<domain>`, `v=BIMI1`.
    pub fn bimi() -> Self {
        Self {
            kind: CheckKind::Bimi,
            label: "default._bimi",
            version_tag: "v=BIMI1",
            name: "BIMI",
        }
    }

    /// MTA-STS: `_mta-sts.<domain>`, `v=STSv1`.
    pub fn mta_sts() -> Self {
        Self {
            kind: CheckKind::MtaSts,
            label: "_mta-sts",
            version_tag: "v=STSv1",
            name: "MTA-STS",
        }
    }

    /// SMTP TLS reporting: `_smtp._tls.<domain>`, `v=TLSRPTv1`.
    pub fn tls_report() -> Self {
        Self {
            kind: CheckKind::TlsReport,
            label: "_smtp._tls",
            version_tag: "v=TLSRPTv1",
            name: "TLS-RPT",
        }
    }
}

#[async_trait]
impl Analyzer for TxtPolicyAnalyzer {
    fn kind(&self) -> CheckKind {
        self.kind
    }

    async fn analyze(&self, resolver: &dyn DnsResolver, domain: &Domain) -> CheckOutcome {
        let query = domain.prefixed(self.label);
        let finding = match find_txt_record(resolver, &query, self.version_tag).await {
            Ok(Some(record)) => Finding::good()
                .with_message(format!("{} record found", self.name))
                .with_record(record),
            Ok(None) => Finding::bad(format!("No {} record found", self.name)),
            Err(e) => check_failed(self.kind, domain, &e),
        };
        finding.into()
    }
}
