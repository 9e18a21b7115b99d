//! Weighted posture score and human-readable summary lists.

use std::collections::BTreeMap;

use dns_posture_toolbox::{CheckKind, CheckOutcome, Status, Strength};

/// Score plus the derived summary lists.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCard {
    /// 0.00 to 5.00, rounded to two decimals.
    pub score: f64,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub risks: Vec<String>,
}

/// Weight of `kind` in the overall score; `None` for checks that are reported
/// but not scored.
pub fn weight(kind: CheckKind) -> Option<f64> {
    match kind {
        CheckKind::Nameservers | CheckKind::Smtp | CheckKind::Dnssec | CheckKind::Tls => Some(0.5),
        CheckKind::Spf | CheckKind::Dmarc => Some(0.75),
        CheckKind::Dane | CheckKind::TlsReport | CheckKind::MtaSts | CheckKind::Bimi => Some(0.25),
        CheckKind::Dkim | CheckKind::ZoneTransfer => None,
    }
}

/// Summary lines for one check kind.
struct Template {
    strength: &'static str,
    improvement: &'static str,
    risk: &'static str,
}

fn template(kind: CheckKind) -> Template {
    match kind {
        CheckKind::Spf => Template {
            strength: "SPF is properly configured",
            improvement: "Configure SPF to list the servers allowed to send mail for your domain",
            risk: "Emails could be spoofed from your domain",
        },
        CheckKind::Dmarc => Template {
            strength: "DMARC policy is published",
            improvement: "Publish a DMARC record to control how receivers treat unauthenticated mail",
            risk: "Receivers have no policy for mail that fails SPF and DKIM",
        },
        CheckKind::Dkim => Template {
            strength: "DKIM signing keys are published",
            improvement: "Publish DKIM keys so receivers can verify message signatures",
            risk: "Message content can be altered in transit without detection",
        },
        CheckKind::Bimi => Template {
            strength: "BIMI brand indicator is published",
            improvement: "Publish a BIMI record to display your logo in supporting mail clients",
            risk: "Recipients cannot visually confirm mail from your brand",
        },
        CheckKind::Dnssec => Template {
            strength: "DNSSEC is enabled",
            improvement: "Enable DNSSEC to protect your DNS answers from tampering",
            risk: "DNS responses for your domain could be forged",
        },
        CheckKind::ZoneTransfer => Template {
            strength: "Zone transfers are refused",
            improvement: "Restrict zone transfers (AXFR) to your secondary nameservers",
            risk: "Anyone can download the full contents of your zone",
        },
        CheckKind::Nameservers => Template {
            strength: "Multiple nameservers provide redundancy",
            improvement: "Use at least two nameservers on separate networks",
            risk: "A single nameserver outage takes your domain offline",
        },
        CheckKind::Smtp => Template {
            strength: "Mail servers accept connections",
            improvement: "Make sure your mail servers are reachable",
            risk: "Inbound mail may be lost",
        },
        CheckKind::Dane => Template {
            strength: "DANE TLSA records protect inbound SMTP",
            improvement: "Publish TLSA records for your MX hosts to enable DANE",
            risk: "SMTP connections to your mail servers can be downgraded",
        },
        CheckKind::Tls => Template {
            strength: "Mail servers offer TLS",
            improvement: "Enable STARTTLS on your mail servers",
            risk: "Mail to your domain can be read in transit",
        },
        CheckKind::TlsReport => Template {
            strength: "SMTP TLS reporting is enabled",
            improvement: "Publish a TLS-RPT record to receive reports about TLS delivery failures",
            risk: "TLS delivery failures to your domain go unnoticed",
        },
        CheckKind::MtaSts => Template {
            strength: "MTA-STS policy is published",
            improvement: "Publish an MTA-STS policy to require TLS for inbound mail",
            risk: "Inbound mail can be delivered without encryption",
        },
    }
}

/// Extra improvement for a good record whose policy is weak.
fn weak_policy_improvement(kind: CheckKind) -> Option<&'static str> {
    match kind {
        CheckKind::Spf => Some("Tighten your SPF record to end with -all or ~all"),
        CheckKind::Dmarc => Some("Move your DMARC policy from p=none to quarantine or reject"),
        _ => None,
    }
}

/// Improvement for a `warning` finding. An unprobed zone transfer check is
/// the only zone-transfer warning and says nothing about the zone.
fn warning_improvement(kind: CheckKind) -> Option<&'static str> {
    match kind {
        CheckKind::ZoneTransfer => None,
        _ => Some(template(kind).improvement),
    }
}

fn is_weak(outcome: &CheckOutcome) -> bool {
    outcome
        .as_single()
        .is_some_and(|f| f.strength == Some(Strength::Weak))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Score a set of findings.
///
/// Only kinds with a weight take part in the score; an empty or entirely
/// unweighted set scores `0.0`. Lists follow declaration order because
/// `findings` is ordered by [`CheckKind`]. `error` findings add no lines.
pub fn score(findings: &BTreeMap<CheckKind, CheckOutcome>) -> ScoreCard {
    let mut total = 0.0;
    let mut earned = 0.0;
    let mut card = ScoreCard {
        score: 0.0,
        strengths: Vec::new(),
        improvements: Vec::new(),
        risks: Vec::new(),
    };

    for (&kind, outcome) in findings {
        let status = outcome.status();

        if let Some(w) = weight(kind) {
            total += w;
            if status == Status::Good {
                earned += w;
            }
        }

        let lines = template(kind);
        match status {
            Status::Good => {
                card.strengths.push(lines.strength.to_string());
                if is_weak(outcome) {
                    if let Some(line) = weak_policy_improvement(kind) {
                        card.improvements.push(line.to_string());
                    }
                }
            }
            Status::Bad => {
                card.improvements.push(lines.improvement.to_string());
                card.risks.push(lines.risk.to_string());
            }
            Status::Warning => {
                if let Some(line) = warning_improvement(kind) {
                    card.improvements.push(line.to_string());
                }
            }
            Status::Error => {}
        }
    }

    if total > 0.0 {
        card.score = round2(earned / total * 5.0);
    }
    card
}
