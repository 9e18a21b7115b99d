//! DANE for inbound SMTP: TLSA records on `_25._tcp.<mx>`.

use async_trait::async_trait;
use futures::future::join_all;

use super::{Analyzer, check_failed};
use crate::domain::Domain;
use crate::error::ToolboxResult;
use crate::resolver::DnsResolver;
use crate::types::{CheckKind, CheckOutcome, DnsQueryType, Finding, FindingDetail};

pub struct DaneAnalyzer;

impl DaneAnalyzer {
    async fn has_tlsa(resolver: &dyn DnsResolver, mx_host: &str) -> ToolboxResult<bool> {
        let name = format!("_25._tcp.{mx_host}");
        Ok(resolver.lookup(&name, DnsQueryType::Tlsa).await?.is_found())
    }
}

#[async_trait]
impl Analyzer for DaneAnalyzer {
    fn kind(&self) -> CheckKind {
        CheckKind::Dane
    }

    async fn analyze(&self, resolver: &dyn DnsResolver, domain: &Domain) -> CheckOutcome {
        let mx_hosts = match resolver.lookup(domain.as_str(), DnsQueryType::Mx).await {
            Ok(outcome) => outcome.values(),
            Err(e) => return check_failed(self.kind(), domain, &e).into(),
        };
        // Null MX (`0 .`) has no host to carry TLSA.
        let mx_hosts: Vec<String> = mx_hosts
            .into_iter()
            .map(|mx| mx.trim().trim_end_matches('.').to_string())
            .filter(|mx| !mx.is_empty())
            .collect();
        if mx_hosts.is_empty() {
            return Finding::bad("No MX records found").into();
        }

        let results = join_all(mx_hosts.iter().map(|mx| Self::has_tlsa(resolver, mx))).await;
        let mut tlsa_hosts = Vec::new();
        for (mx, result) in mx_hosts.iter().zip(results) {
            match result {
                Ok(true) => tlsa_hosts.push(mx.clone()),
                Ok(false) => {}
                Err(e) => return check_failed(self.kind(), domain, &e).into(),
            }
        }

        let finding = if tlsa_hosts.is_empty() {
            Finding::bad("No TLSA records found for any MX host")
        } else {
            Finding::good().with_message(format!(
                "TLSA records found for {} of {} MX hosts",
                tlsa_hosts.len(),
                mx_hosts.len()
            ))
        };
        finding
            .with_detail(FindingDetail::Dane {
                mx_hosts,
                tlsa_hosts,
            })
            .into()
    }
}
