//! DMARC policy check.

use async_trait::async_trait;

use super::{Analyzer, check_failed, find_txt_record};
use crate::domain::Domain;
use crate::resolver::DnsResolver;
use crate::types::{CheckKind, CheckOutcome, Finding, Strength};

const DMARC_PREFIX: &str = "v=DMARC1";

/// Grade a DMARC record by its `p=` tag.
///
/// A published `v=DMARC1` record is always `good`; the policy only sets the
/// strength (`reject` strong, `quarantine` medium, `none` or missing weak).
fn policy_strength(record: &str) -> (Strength, Option<String>) {
    let policy = record
        .split(';')
        .filter_map(|tag| tag.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("p"))
        .map(|(_, value)| value.trim().to_ascii_lowercase());

    let strength = match policy.as_deref() {
        Some("reject") => Strength::Strong,
        Some("quarantine") => Strength::Medium,
        _ => Strength::Weak,
    };
    (strength, policy)
}

/// TXT on `_dmarc.<domain>`, first record starting `v=DMARC1`.
pub struct DmarcAnalyzer;

#[async_trait]
impl Analyzer for DmarcAnalyzer {
    fn kind(&self) -> CheckKind {
        CheckKind::Dmarc
    }

    async fn analyze(&self, resolver: &dyn DnsResolver, domain: &Domain) -> CheckOutcome {
        let name = domain.prefixed("_dmarc");
        let finding = match find_txt_record(resolver, &name, DMARC_PREFIX).await {
            Ok(Some(record)) => {
                let (strength, policy) = policy_strength(&record);
                let message = match policy {
                    Some(p) => format!("DMARC record found with policy p={p}"),
                    None => "DMARC record found without a policy tag".to_string(),
                };
                Finding::good()
                    .with_message(message)
                    .with_strength(strength)
                    .with_record(record)
            }
            Ok(None) => Finding::bad("No DMARC record found"),
            Err(e) => check_failed(self.kind(), domain, &e),
        };
        finding.into()
    }
}
