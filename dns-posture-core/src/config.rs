//! Check configuration.
//!
//! Everything the orchestrator needs is carried by an explicit [`CheckConfig`]
//! value; nothing is read from the environment here.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use dns_posture_toolbox::command::{DEFAULT_COMMAND_TIMEOUT, DEFAULT_MAX_OUTPUT_BYTES};
use dns_posture_toolbox::resolver::{DEFAULT_MAX_IN_FLIGHT, DEFAULT_RETRIES, DEFAULT_TIMEOUT};
use dns_posture_toolbox::{CheckKind, DEFAULT_DKIM_SELECTORS, is_valid_domain};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

const DEFAULT_REQUEST_DEADLINE_SECS: u64 = 30;
const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_RATE_WINDOW_SECS: u64 = 3600;
const DEFAULT_RATE_MAX_REQUESTS: u32 = 30;

/// Orchestrator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Per-attempt DNS timeout.
    pub dns_timeout_secs: u64,
    /// Extra attempts after the first for transient DNS failures.
    pub dns_retries: u32,
    /// Upstream nameserver; `None` uses the system configuration.
    pub nameserver: Option<IpAddr>,
    /// Lookups one report may have in flight at once.
    pub max_concurrent_queries: usize,
    /// Deadline shared by every analyzer of one report.
    pub request_deadline_secs: u64,
    pub dkim_selectors: Vec<String>,
    /// Checks to run, in any order; reports always follow declaration order.
    pub checks: Vec<CheckKind>,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    pub zone_transfer: ZoneTransferConfig,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            dns_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            dns_retries: DEFAULT_RETRIES,
            nameserver: None,
            max_concurrent_queries: DEFAULT_MAX_IN_FLIGHT,
            request_deadline_secs: DEFAULT_REQUEST_DEADLINE_SECS,
            dkim_selectors: DEFAULT_DKIM_SELECTORS.iter().map(ToString::to_string).collect(),
            checks: CheckKind::supported(),
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
            zone_transfer: ZoneTransferConfig::default(),
        }
    }
}

/// Report cache settings. Without `dir` reports are cached in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub dir: Option<PathBuf>,
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

/// Fixed-window rate limiting per client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: DEFAULT_RATE_WINDOW_SECS,
            max_requests: DEFAULT_RATE_MAX_REQUESTS,
        }
    }
}

/// AXFR probe settings. Disabled unless explicitly turned on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneTransferConfig {
    pub enabled: bool,
    pub allowed_programs: Vec<String>,
    pub program: String,
    pub timeout_secs: u64,
    pub max_output_bytes: usize,
}

impl Default for ZoneTransferConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allowed_programs: vec!["dig".to_string()],
            program: "dig".to_string(),
            timeout_secs: DEFAULT_COMMAND_TIMEOUT.as_secs(),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

impl CheckConfig {
    /// Reject settings the orchestrator cannot honor.
    pub fn validate(&self) -> CoreResult<()> {
        if self.checks.is_empty() {
            return Err(config_error("at least one check must be enabled"));
        }
        if let Some(kind) = self.checks.iter().find(|k| !k.is_supported()) {
            return Err(config_error(format!(
                "check '{kind}' is not supported (requires a live mail server connection)"
            )));
        }

        if self.checks.contains(&CheckKind::Dkim) && self.dkim_selectors.is_empty() {
            return Err(config_error("dkim_selectors must not be empty"));
        }
        if let Some(selector) = self.dkim_selectors.iter().find(|s| !is_valid_domain(s)) {
            return Err(config_error(format!("invalid DKIM selector '{selector}'")));
        }

        for (name, value) in [
            ("dns_timeout_secs", self.dns_timeout_secs),
            ("request_deadline_secs", self.request_deadline_secs),
            ("cache.ttl_secs", self.cache.ttl_secs),
            ("rate_limit.window_secs", self.rate_limit.window_secs),
        ] {
            if value == 0 {
                return Err(config_error(format!("{name} must be greater than zero")));
            }
        }
        if self.max_concurrent_queries == 0 {
            return Err(config_error("max_concurrent_queries must be greater than zero"));
        }
        if self.rate_limit.max_requests == 0 {
            return Err(config_error("rate_limit.max_requests must be greater than zero"));
        }

        let zt = &self.zone_transfer;
        if zt.enabled {
            if zt.timeout_secs == 0 || zt.max_output_bytes == 0 {
                return Err(config_error(
                    "zone_transfer timeout and output cap must be greater than zero",
                ));
            }
            if !zt.allowed_programs.iter().any(|p| p == &zt.program) {
                return Err(config_error(format!(
                    "zone_transfer.program '{}' is not in allowed_programs",
                    zt.program
                )));
            }
        }

        Ok(())
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_secs)
    }

    pub fn request_deadline(&self) -> Duration {
        Duration::from_secs(self.request_deadline_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    /// Configured checks, deduplicated and in declaration order.
    pub fn enabled_checks(&self) -> Vec<CheckKind> {
        let mut checks = self.checks.clone();
        checks.sort_unstable();
        checks.dedup();
        checks
    }
}

fn config_error(msg: impl Into<String>) -> CoreError {
    CoreError::ConfigError(msg.into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = CheckConfig::default();
        config.validate().unwrap();
        assert_eq!(config.dns_timeout_secs, 5);
        assert_eq!(config.dns_retries, 3);
        assert_eq!(config.request_deadline_secs, 30);
        assert_eq!(config.cache.ttl_secs, 3600);
        assert_eq!(config.rate_limit.max_requests, 30);
        assert_eq!(config.max_concurrent_queries, 12);
        assert_eq!(config.nameserver, None);
        assert!(!config.zone_transfer.enabled);
        assert_eq!(config.enabled_checks(), CheckKind::supported());
    }

    #[test]
    fn rejects_unsupported_checks() {
        let config = CheckConfig {
            checks: vec![CheckKind::Spf, CheckKind::Smtp],
            ..CheckConfig::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::ConfigError(m)) if m.contains("smtp")));
    }

    #[test]
    fn rejects_bad_selectors() {
        let empty = CheckConfig {
            dkim_selectors: vec![],
            ..CheckConfig::default()
        };
        assert!(empty.validate().is_err());

        let invalid = CheckConfig {
            dkim_selectors: vec!["bad selector".into()],
            ..CheckConfig::default()
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeouts() {
        let config = CheckConfig {
            request_deadline_secs: 0,
            ..CheckConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_query_bound() {
        let config = CheckConfig {
            max_concurrent_queries: 0,
            ..CheckConfig::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::ConfigError(m)) if m.contains("max_concurrent_queries")));
    }

    #[test]
    fn probe_program_must_be_allow_listed() {
        let mut config = CheckConfig::default();
        config.zone_transfer.enabled = true;
        config.zone_transfer.program = "host".into();
        assert!(config.validate().is_err());

        config.zone_transfer.allowed_programs.push("host".into());
        config.validate().unwrap();
    }

    #[test]
    fn enabled_checks_follow_declaration_order() {
        let config = CheckConfig {
            checks: vec![CheckKind::Nameservers, CheckKind::Spf, CheckKind::Dmarc, CheckKind::Spf],
            ..CheckConfig::default()
        };
        assert_eq!(
            config.enabled_checks(),
            vec![CheckKind::Spf, CheckKind::Dmarc, CheckKind::Nameservers]
        );
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: CheckConfig =
            serde_json::from_str(r#"{"checks": ["spf", "dmarc"], "rate_limit": {"max_requests": 3}}"#)
                .unwrap();
        assert_eq!(config.checks, vec![CheckKind::Spf, CheckKind::Dmarc]);
        assert_eq!(config.rate_limit.max_requests, 3);
        assert_eq!(config.rate_limit.window_secs, 3600);
    }

    #[test]
    fn nameserver_parses_as_ip() {
        let config: CheckConfig = serde_json::from_str(r#"{"nameserver": "9.9.9.9"}"#).unwrap();
        assert_eq!(config.nameserver, Some(IpAddr::from([9, 9, 9, 9])));
        assert!(serde_json::from_str::<CheckConfig>(r#"{"nameserver": "dns.example"}"#).is_err());
    }
}
