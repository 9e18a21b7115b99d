use async_trait::async_trait;

use super::{Analyzer, check_failed, nameserver_names};
use crate::domain::Domain;
use crate::resolver::DnsResolver;
use crate::types::{CheckKind, CheckOutcome, Finding};

/// NS redundancy: two or more targets are good, a single one is a warning.
pub struct NameserversAnalyzer;

#[async_trait]
impl Analyzer for NameserversAnalyzer {
    fn kind(&self) -> CheckKind {
        CheckKind::Nameservers
    }

    async fn analyze(&self, resolver: &dyn DnsResolver, domain: &Domain) -> CheckOutcome {
        let names = match nameserver_names(resolver, domain).await {
            Ok(names) => names,
            Err(e) => return check_failed(self.kind(), domain, &e).into(),
        };

        let finding = match names.len() {
            0 => Finding::bad("No NS records found"),
            1 => Finding::warning("Only one nameserver found, recommend multiple for redundancy")
                .with_records(names),
            n => Finding::good()
                .with_message(format!("{n} nameservers found"))
                .with_records(names),
        };
        finding.into()
    }
}
