//! DNSSEC presence heuristic.
//!
//! Only checks that DNSKEY or DS records exist at the apex. It does not
//! validate signatures, so a `good` result is not proof of a validating chain.

use async_trait::async_trait;

use super::{Analyzer, check_failed};
use crate::domain::Domain;
use crate::resolver::DnsResolver;
use crate::types::{CheckKind, CheckOutcome, DnsQueryType, Finding, FindingDetail};

pub struct DnssecAnalyzer;

#[async_trait]
impl Analyzer for DnssecAnalyzer {
    fn kind(&self) -> CheckKind {
        CheckKind::Dnssec
    }

    async fn analyze(&self, resolver: &dyn DnsResolver, domain: &Domain) -> CheckOutcome {
        let (dnskey, ds) = futures::join!(
            resolver.lookup(domain.as_str(), DnsQueryType::Dnskey),
            resolver.lookup(domain.as_str(), DnsQueryType::Ds),
        );

        let dnskey_count = dnskey.as_ref().map_or(0, |outcome| outcome.records().len());
        let ds_count = ds.as_ref().map_or(0, |outcome| outcome.records().len());

        // Records on either side are enough; a failure only matters when
        // nothing was found.
        if dnskey_count == 0 && ds_count == 0 {
            if let Some(e) = dnskey.err().or(ds.err()) {
                return check_failed(self.kind(), domain, &e).into();
            }
        }

        let finding = if dnskey_count > 0 || ds_count > 0 {
            Finding::good()
                .with_message(format!(
                    "DNSSEC records found: {dnskey_count} DNSKEY, {ds_count} DS"
                ))
                .with_detail(FindingDetail::Dnssec {
                    dnskey_count,
                    ds_count,
                })
        } else {
            Finding::bad("No DNSSEC records found")
        };
        finding.into()
    }
}
