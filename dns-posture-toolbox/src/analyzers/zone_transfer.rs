//! Zone transfer (AXFR) exposure.
//!
//! Without a probe the check only reports that exposure was not tested. With
//! one, every apex nameserver is asked for a full transfer through the
//! sandboxed [`CommandRunner`].

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use super::{Analyzer, check_failed, nameserver_names};
use crate::command::CommandRunner;
use crate::domain::Domain;
use crate::resolver::DnsResolver;
use crate::types::{CheckKind, CheckOutcome, Finding, FindingDetail};

/// Runner and program used to attempt AXFR.
#[derive(Clone)]
pub struct ZoneTransferProbe {
    runner: Arc<dyn CommandRunner>,
    program: String,
}

impl ZoneTransferProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Whether `nameserver` hands out the zone. Probe failures count as refused.
    async fn allows_transfer(&self, domain: &Domain, nameserver: &str) -> bool {
        let args = vec![
            "AXFR".to_string(),
            domain.as_str().to_string(),
            format!("@{nameserver}"),
        ];
        match self.runner.run(&self.program, &args).await {
            Ok(output) => transfer_succeeded(&output.stdout),
            Err(e) => {
                log::warn!("[zone_transfer] AXFR probe of {nameserver} for {domain} failed: {e}");
                false
            }
        }
    }
}

/// A transfer answer carries the zone's SOA; refusals only print comments.
fn transfer_succeeded(output: &str) -> bool {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(';'))
        .any(|line| line.split_whitespace().any(|field| field.eq_ignore_ascii_case("SOA")))
}

pub struct ZoneTransferAnalyzer {
    probe: Option<ZoneTransferProbe>,
}

impl ZoneTransferAnalyzer {
    pub fn new(probe: Option<ZoneTransferProbe>) -> Self {
        Self { probe }
    }
}

#[async_trait]
impl Analyzer for ZoneTransferAnalyzer {
    fn kind(&self) -> CheckKind {
        CheckKind::ZoneTransfer
    }

    async fn analyze(&self, resolver: &dyn DnsResolver, domain: &Domain) -> CheckOutcome {
        let nameservers = match nameserver_names(resolver, domain).await {
            Ok(names) => names,
            Err(e) => return check_failed(self.kind(), domain, &e).into(),
        };
        if nameservers.is_empty() {
            return Finding::error("No NS records found").into();
        }

        let Some(probe) = &self.probe else {
            return Finding::warning("Zone transfer exposure not probed")
                .with_records(nameservers)
                .into();
        };

        let verdicts = join_all(
            nameservers
                .iter()
                .map(|ns| probe.allows_transfer(domain, ns)),
        )
        .await;
        let exposed: Vec<String> = nameservers
            .iter()
            .zip(verdicts)
            .filter(|(_, allowed)| *allowed)
            .map(|(ns, _)| ns.clone())
            .collect();

        let finding = if exposed.is_empty() {
            Finding::good().with_message("Zone transfer refused by all nameservers")
        } else {
            Finding::bad(format!("Zone transfer allowed by {}", exposed.join(", ")))
        };
        finding
            .with_detail(FindingDetail::ZoneTransfer {
                nameservers,
                exposed,
            })
            .into()
    }
}
