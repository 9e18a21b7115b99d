//! Report and rate-window types

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dns_posture_toolbox::{CheckKind, CheckOutcome, Status};
use serde::{Deserialize, Serialize};

/// Posture report for one domain.
///
/// Created once per check and never mutated afterwards; a cached copy
/// re-serializes to the same JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub domain: String,
    #[serde(with = "crate::utils::datetime")]
    pub checked_at: DateTime<Utc>,
    /// One outcome per executed check, in declaration order.
    pub findings: BTreeMap<CheckKind, CheckOutcome>,
    /// Weighted share of good checks, 0.00 to 5.00.
    pub overall_score: f64,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub risks: Vec<String>,
}

impl CheckReport {
    /// Collapsed status of `kind`, if it was checked.
    pub fn status_of(&self, kind: CheckKind) -> Option<Status> {
        self.findings.get(&kind).map(CheckOutcome::status)
    }
}

/// Fixed-window counter for one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateState {
    pub count: u32,
    #[serde(with = "crate::utils::datetime")]
    pub window_reset_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dns_posture_toolbox::Finding;

    use super::*;

    #[test]
    fn report_json_shape() {
        let mut findings = BTreeMap::new();
        findings.insert(CheckKind::Nameservers, Finding::bad("No NS records found").into());
        findings.insert(CheckKind::Spf, Finding::good().into());
        let report = CheckReport {
            domain: "example.com".into(),
            checked_at: DateTime::<Utc>::default(),
            findings,
            overall_score: 2.5,
            strengths: vec!["SPF record is configured".into()],
            improvements: vec![],
            risks: vec![],
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["checkedAt"], "1970-01-01T00:00:00+00:00");
        assert_eq!(json["overallScore"], 2.5);
        assert_eq!(json["findings"]["spf"]["type"], "single");
        assert_eq!(json["findings"]["spf"]["value"]["status"], "good");

        let text = serde_json::to_string(&report).unwrap();
        assert!(text.find("\"spf\"").unwrap() < text.find("\"nameservers\"").unwrap());
        assert_eq!(report.status_of(CheckKind::Nameservers), Some(Status::Bad));
        assert_eq!(report.status_of(CheckKind::Dane), None);
    }
}
