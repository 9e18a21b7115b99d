//! SPF (Sender Policy Framework) check.

use async_trait::async_trait;

use super::{Analyzer, check_failed, find_txt_record};
use crate::domain::Domain;
use crate::resolver::DnsResolver;
use crate::types::{CheckKind, CheckOutcome, Finding, FindingDetail, Strength};

const SPF_PREFIX: &str = "v=spf1";

/// Parsed view of an SPF record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpfPolicy {
    /// Whitespace-separated terms, including the version tag.
    pub mechanisms: Vec<String>,
    pub strength: Strength,
}

/// Split an SPF record into terms and grade its `all` mechanism.
///
/// `-all` wins over `~all` when both appear; anything else (`?all`, `+all`,
/// no `all` at all) is weak.
pub fn parse_spf(record: &str) -> SpfPolicy {
    let mechanisms = record.split_whitespace().map(ToString::to_string).collect();
    let strength = if record.contains("-all") {
        Strength::Strong
    } else if record.contains("~all") {
        Strength::Medium
    } else {
        Strength::Weak
    };
    SpfPolicy {
        mechanisms,
        strength,
    }
}

fn strength_message(strength: Strength) -> &'static str {
    match strength {
        Strength::Strong => "SPF record found with a hard fail policy (-all)",
        Strength::Medium => "SPF record found with a soft fail policy (~all)",
        Strength::Weak => "SPF record found but it does not reject unauthorized senders",
    }
}

/// TXT on the apex, first record starting `v=spf1`.
pub struct SpfAnalyzer;

#[async_trait]
impl Analyzer for SpfAnalyzer {
    fn kind(&self) -> CheckKind {
        CheckKind::Spf
    }

    async fn analyze(&self, resolver: &dyn DnsResolver, domain: &Domain) -> CheckOutcome {
        let finding = match find_txt_record(resolver, domain.as_str(), SPF_PREFIX).await {
            Ok(Some(record)) => {
                let policy = parse_spf(&record);
                Finding::good()
                    .with_message(strength_message(policy.strength))
                    .with_strength(policy.strength)
                    .with_record(record)
                    .with_detail(FindingDetail::Spf {
                        mechanisms: policy.mechanisms,
                    })
            }
            Ok(None) => Finding::bad("No SPF record found"),
            Err(e) => check_failed(self.kind(), domain, &e),
        };
        finding.into()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ToolboxError;
    use crate::resolver::StaticResolver;
    use crate::types::{DnsQueryType, Status};

    fn domain() -> Domain {
        Domain::parse("example.com").unwrap()
    }

    #[test]
    fn test_parse_spf_hard_fail() {
        let policy = parse_spf("v=spf1 include:_spf.example.com -all");
        assert_eq!(policy.strength, Strength::Strong);
        assert_eq!(
            policy.mechanisms,
            vec!["v=spf1", "include:_spf.example.com", "-all"]
        );
    }

    #[test]
    fn test_parse_spf_soft_fail() {
        assert_eq!(parse_spf("v=spf1 ~all").strength, Strength::Medium);
    }

    #[test]
    fn test_parse_spf_pass_all_is_weak() {
        assert_eq!(parse_spf("v=spf1 +all").strength, Strength::Weak);
        assert_eq!(parse_spf("v=spf1 ?all").strength, Strength::Weak);
    }

    #[test]
    fn test_parse_spf_hard_fail_wins() {
        assert_eq!(parse_spf("v=spf1 ~all -all").strength, Strength::Strong);
    }

    #[test]
    fn test_parse_spf_drops_empty_tokens() {
        let policy = parse_spf("v=spf1   mx  -all ");
        assert_eq!(policy.mechanisms, vec!["v=spf1", "mx", "-all"]);
    }

    #[tokio::test]
    async fn test_selects_spf_among_other_txt_records() {
        let resolver = StaticResolver::new().with_records(
            "example.com",
            DnsQueryType::Txt,
            [
                "google-site-verification=abc",
                "v=spf1 include:_spf.example.com -all",
                "v=spf1 ~all",
            ],
        );
        let outcome = SpfAnalyzer.analyze(&resolver, &domain()).await;
        let finding = outcome.as_single().unwrap();
        assert_eq!(finding.status, Status::Good);
        assert_eq!(finding.strength, Some(Strength::Strong));
        assert_eq!(
            finding.record.as_deref(),
            Some("v=spf1 include:_spf.example.com -all")
        );
        assert!(matches!(
            &finding.detail,
            Some(FindingDetail::Spf { mechanisms }) if mechanisms.len() == 3
        ));
    }

    #[tokio::test]
    async fn test_missing_spf_is_bad() {
        let resolver = StaticResolver::new().with_records(
            "example.com",
            DnsQueryType::Txt,
            ["v=DMARC1; p=none"],
        );
        let outcome = SpfAnalyzer.analyze(&resolver, &domain()).await;
        let finding = outcome.as_single().unwrap();
        assert_eq!(finding.status, Status::Bad);
        assert_eq!(finding.message.as_deref(), Some("No SPF record found"));
    }

    #[tokio::test]
    async fn test_resolver_failure_is_error() {
        let resolver = StaticResolver::new().with_failure(
            "example.com",
            DnsQueryType::Txt,
            ToolboxError::NetworkError("SERVFAIL".into()),
        );
        let outcome = SpfAnalyzer.analyze(&resolver, &domain()).await;
        let finding = outcome.as_single().unwrap();
        assert_eq!(finding.status, Status::Error);
        assert_eq!(finding.message.as_deref(), Some("Check failed"));
    }
}
