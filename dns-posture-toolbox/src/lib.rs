//! DNS probes for email-authentication posture.
//!
//! Resolver adapter with timeout and retry, domain normalisation, the
//! per-check analyzers and a sandboxed runner for the optional AXFR probe.
//! Everything here is stateless; caching, rate limiting and scoring live in
//! `dns-posture-core`.

pub mod analyzers;
pub mod command;
mod domain;
mod error;
pub mod resolver;
mod types;

pub use analyzers::{
    Analyzer, AnalyzerOptions, DEFAULT_DKIM_SELECTORS, ZoneTransferProbe, build_analyzer,
};
pub use command::{CommandOutput, CommandRunner, SandboxedCommandRunner};
pub use domain::{Domain, clean_domain, is_valid_domain};
pub use error::{ToolboxError, ToolboxResult};
pub use resolver::{
    BoundedResolver, DnsResolver, HickoryDnsResolver, StaticResolver, retry_transient,
};
pub use types::{
    CheckKind, CheckOutcome, DnsLookupRecord, DnsQueryType, Finding, FindingDetail, LookupOutcome,
    Status, Strength,
};
