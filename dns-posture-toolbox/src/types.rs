//! Public types returned by resolvers and analyzers.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// DNS record type understood by the resolver adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DnsQueryType {
    /// IPv4 address record.
    A,
    /// Text record.
    Txt,
    /// Name server record.
    Ns,
    /// DNSSEC public key record.
    Dnskey,
    /// Delegation signer record (published in the parent zone).
    Ds,
    /// Start of authority record.
    Soa,
    /// Mail exchange record.
    Mx,
    /// TLS certificate association record (DANE).
    Tlsa,
}

impl fmt::Display for DnsQueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::Txt => write!(f, "TXT"),
            Self::Ns => write!(f, "NS"),
            Self::Dnskey => write!(f, "DNSKEY"),
            Self::Ds => write!(f, "DS"),
            Self::Soa => write!(f, "SOA"),
            Self::Mx => write!(f, "MX"),
            Self::Tlsa => write!(f, "TLSA"),
        }
    }
}

impl FromStr for DnsQueryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "A" => Ok(Self::A),
            "TXT" => Ok(Self::Txt),
            "NS" => Ok(Self::Ns),
            "DNSKEY" => Ok(Self::Dnskey),
            "DS" => Ok(Self::Ds),
            "SOA" => Ok(Self::Soa),
            "MX" => Ok(Self::Mx),
            "TLSA" => Ok(Self::Tlsa),
            _ => Err(format!("Unsupported DNS query type: {s}")),
        }
    }
}

/// A single DNS record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsLookupRecord {
    /// Record type.
    pub record_type: DnsQueryType,
    /// Record name (owner), without trailing dot.
    pub name: String,
    /// Record value / rdata.
    ///
    /// - `TXT`: character-strings concatenated without separators.
    /// - `NS`, `MX`: target host name with the trailing dot removed (no preference for MX).
    /// - everything else: presentation format.
    pub value: String,
    /// Time-to-live in seconds.
    pub ttl: u32,
}

/// Result of a successful DNS exchange.
///
/// Authoritative absence is a normal outcome, not an error: analyzers map it
/// to a `bad` finding while transport failures become `error` findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// At least one record of the requested type.
    Found(Vec<DnsLookupRecord>),
    /// NXDOMAIN or NOERROR with an empty answer section.
    NotFound,
}

impl LookupOutcome {
    /// Records of a found answer, empty for `NotFound`.
    pub fn records(&self) -> &[DnsLookupRecord] {
        match self {
            Self::Found(records) => records,
            Self::NotFound => &[],
        }
    }

    /// Record values in resolver order.
    pub fn values(&self) -> Vec<String> {
        self.records().iter().map(|r| r.value.clone()).collect()
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(records) if !records.is_empty())
    }
}

/// Every check the posture model knows about, in report order.
///
/// Ordering is significant: report maps and the strengths / improvements /
/// risks lists follow declaration order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Spf,
    Dmarc,
    Dkim,
    Bimi,
    Dnssec,
    ZoneTransfer,
    Nameservers,
    Smtp,
    Dane,
    Tls,
    TlsReport,
    MtaSts,
}

impl CheckKind {
    /// All kinds in declaration order.
    pub const ALL: [Self; 12] = [
        Self::Spf,
        Self::Dmarc,
        Self::Dkim,
        Self::Bimi,
        Self::Dnssec,
        Self::ZoneTransfer,
        Self::Nameservers,
        Self::Smtp,
        Self::Dane,
        Self::Tls,
        Self::TlsReport,
        Self::MtaSts,
    ];

    /// Wire name (matches the serde representation).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spf => "spf",
            Self::Dmarc => "dmarc",
            Self::Dkim => "dkim",
            Self::Bimi => "bimi",
            Self::Dnssec => "dnssec",
            Self::ZoneTransfer => "zone_transfer",
            Self::Nameservers => "nameservers",
            Self::Smtp => "smtp",
            Self::Dane => "dane",
            Self::Tls => "tls",
            Self::TlsReport => "tls_report",
            Self::MtaSts => "mta_sts",
        }
    }

    /// Whether an analyzer exists for this kind.
    ///
    /// SMTP and TLS need live connections to the mail hosts and are only part
    /// of the model so that reports from other producers can be scored.
    pub fn is_supported(self) -> bool {
        !matches!(self, Self::Smtp | Self::Tls)
    }

    /// Kinds that have an analyzer, in declaration order.
    pub fn supported() -> Vec<Self> {
        Self::ALL.into_iter().filter(|k| k.is_supported()).collect()
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| format!("Unknown check kind: {s}"))
    }
}

/// Verdict of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Good,
    Bad,
    Warning,
    Error,
}

/// Policy strength, populated by checks that grade a record (SPF, DMARC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Weak,
    Medium,
    Strong,
}

/// Kind-specific extra data attached to a [`Finding`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum FindingDetail {
    /// SPF terms split on whitespace.
    Spf { mechanisms: Vec<String> },
    /// Number of DNSSEC records found at the apex.
    Dnssec { dnskey_count: usize, ds_count: usize },
    /// Nameservers probed for AXFR and the ones that allowed it.
    ZoneTransfer {
        nameservers: Vec<String>,
        exposed: Vec<String>,
    },
    /// MX hosts and the subset publishing TLSA records.
    Dane {
        mx_hosts: Vec<String>,
        tlsa_hosts: Vec<String>,
    },
}

/// Normalized outcome of one check for one domain.
///
/// Only `status` is mandatory; the rest is filled in when the check has
/// something to say.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Raw record text the verdict is based on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<String>,
    /// Multi-valued answers (nameserver targets), resolver order preserved.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<Strength>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<FindingDetail>,
}

impl Finding {
    fn with_status(status: Status, message: Option<String>) -> Self {
        Self {
            status,
            message,
            record: None,
            records: Vec::new(),
            strength: None,
            detail: None,
        }
    }

    pub fn good() -> Self {
        Self::with_status(Status::Good, None)
    }

    pub fn bad(message: impl Into<String>) -> Self {
        Self::with_status(Status::Bad, Some(message.into()))
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_status(Status::Warning, Some(message.into()))
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_status(Status::Error, Some(message.into()))
    }

    /// Finding recorded when a probe fails unexpectedly.
    pub fn check_failed() -> Self {
        Self::error("Check failed")
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_record(mut self, record: impl Into<String>) -> Self {
        self.record = Some(record.into());
        self
    }

    #[must_use]
    pub fn with_records(mut self, records: Vec<String>) -> Self {
        self.records = records;
        self
    }

    #[must_use]
    pub fn with_strength(mut self, strength: Strength) -> Self {
        self.strength = Some(strength);
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: FindingDetail) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// What an analyzer produces: a single finding, or one finding per DKIM
/// selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum CheckOutcome {
    Single(Finding),
    PerSelector(BTreeMap<String, Finding>),
}

impl CheckOutcome {
    /// Collapse the outcome to one status.
    ///
    /// A per-selector outcome is `Good` when any selector is good, `Error`
    /// when every selector errored, and `Bad` otherwise (including no
    /// selectors at all).
    pub fn status(&self) -> Status {
        match self {
            Self::Single(finding) => finding.status,
            Self::PerSelector(map) => {
                if map.values().any(|f| f.status == Status::Good) {
                    Status::Good
                } else if !map.is_empty() && map.values().all(|f| f.status == Status::Error) {
                    Status::Error
                } else {
                    Status::Bad
                }
            }
        }
    }

    /// The single finding, if this is not a per-selector outcome.
    pub fn as_single(&self) -> Option<&Finding> {
        match self {
            Self::Single(finding) => Some(finding),
            Self::PerSelector(_) => None,
        }
    }

    /// Selectors whose finding is good, in name order.
    pub fn good_selectors(&self) -> Vec<&str> {
        match self {
            Self::Single(_) => Vec::new(),
            Self::PerSelector(map) => map
                .iter()
                .filter(|(_, f)| f.status == Status::Good)
                .map(|(name, _)| name.as_str())
                .collect(),
        }
    }
}

impl From<Finding> for CheckOutcome {
    fn from(finding: Finding) -> Self {
        Self::Single(finding)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn check_kind_wire_names_round_trip() {
        for kind in CheckKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            assert_eq!(kind.as_str().parse::<CheckKind>().unwrap(), kind);
        }
    }

    #[test]
    fn check_kind_from_str_accepts_dashes() {
        assert_eq!("mta-sts".parse::<CheckKind>().unwrap(), CheckKind::MtaSts);
        assert!("carrier-pigeon".parse::<CheckKind>().is_err());
    }

    #[test]
    fn smtp_and_tls_have_no_analyzer() {
        let supported = CheckKind::supported();
        assert!(!supported.contains(&CheckKind::Smtp));
        assert!(!supported.contains(&CheckKind::Tls));
        assert_eq!(supported.len(), 10);
    }

    #[test]
    fn finding_skips_empty_fields() {
        let json = serde_json::to_value(Finding::bad("No SPF record found")).unwrap();
        assert_eq!(json["status"], "bad");
        assert_eq!(json["message"], "No SPF record found");
        assert!(json.get("record").is_none());
        assert!(json.get("records").is_none());
        assert!(json.get("strength").is_none());
    }

    #[test]
    fn per_selector_status_collapses() {
        let mut map = BTreeMap::new();
        map.insert("default".to_string(), Finding::bad("missing"));
        map.insert("google".to_string(), Finding::good());
        let outcome = CheckOutcome::PerSelector(map);
        assert_eq!(outcome.status(), Status::Good);
        assert_eq!(outcome.good_selectors(), vec!["google"]);

        let mut errors = BTreeMap::new();
        errors.insert("default".to_string(), Finding::check_failed());
        assert_eq!(CheckOutcome::PerSelector(errors).status(), Status::Error);

        assert_eq!(CheckOutcome::PerSelector(BTreeMap::new()).status(), Status::Bad);
    }

    #[test]
    fn outcome_serializes_with_type_tag() {
        let outcome = CheckOutcome::Single(Finding::good().with_strength(Strength::Strong));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["type"], "single");
        assert_eq!(json["value"]["strength"], "strong");

        let back: CheckOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(back, outcome);
    }

    #[test]
    fn lookup_outcome_values_keep_order() {
        let outcome = LookupOutcome::Found(vec![
            DnsLookupRecord {
                record_type: DnsQueryType::Ns,
                name: "example.com".into(),
                value: "b.ns.example".into(),
                ttl: 300,
            },
            DnsLookupRecord {
                record_type: DnsQueryType::Ns,
                name: "example.com".into(),
                value: "a.ns.example".into(),
                ttl: 300,
            },
        ]);
        assert_eq!(outcome.values(), vec!["b.ns.example", "a.ns.example"]);
        assert!(LookupOutcome::NotFound.values().is_empty());
    }
}
