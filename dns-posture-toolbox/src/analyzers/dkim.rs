//! DKIM key lookup across a list of common selectors.

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::future::join_all;

use super::{Analyzer, check_failed, find_txt_record};
use crate::domain::Domain;
use crate::resolver::DnsResolver;
use crate::types::{CheckKind, CheckOutcome, Finding};

const DKIM_PREFIX: &str = "v=DKIM1";

/// Selectors probed when none are configured.
pub const DEFAULT_DKIM_SELECTORS: [&str; 6] =
    ["default", "google", "selector1", "selector2", "dkim", "mail"];

/// TXT on `<selector>._domainkey.<domain>` for every selector.
///
/// Selectors are independent: they are queried concurrently and one failing
/// lookup does not affect the others.
pub struct DkimAnalyzer {
    selectors: Vec<String>,
}

impl DkimAnalyzer {
    pub fn new(selectors: Vec<String>) -> Self {
        Self { selectors }
    }

    pub fn selectors(&self) -> &[String] {
        &self.selectors
    }

    async fn check_selector(
        &self,
        resolver: &dyn DnsResolver,
        domain: &Domain,
        selector: &str,
    ) -> Finding {
        let name = domain.prefixed(&format!("{selector}._domainkey"));
        match find_txt_record(resolver, &name, DKIM_PREFIX).await {
            Ok(Some(record)) => Finding::good()
                .with_message(format!("DKIM record found for selector {selector}"))
                .with_record(record),
            Ok(None) => Finding::bad(format!("No DKIM record found for selector {selector}")),
            Err(e) => check_failed(self.kind(), domain, &e),
        }
    }
}

impl Default for DkimAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_DKIM_SELECTORS.iter().map(ToString::to_string).collect())
    }
}

#[async_trait]
impl Analyzer for DkimAnalyzer {
    fn kind(&self) -> CheckKind {
        CheckKind::Dkim
    }

    async fn analyze(&self, resolver: &dyn DnsResolver, domain: &Domain) -> CheckOutcome {
        let lookups = self
            .selectors
            .iter()
            .map(|selector| async move {
                let finding = self.check_selector(resolver, domain, selector).await;
                (selector.clone(), finding)
            });
        let results: BTreeMap<String, Finding> = join_all(lookups).await.into_iter().collect();
        CheckOutcome::PerSelector(results)
    }
}
