//! Fixed answer table implementing [`DnsResolver`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{DnsResolver, normalize_name};
use crate::error::{ToolboxError, ToolboxResult};
use crate::types::{DnsLookupRecord, DnsQueryType, LookupOutcome};

const STATIC_TTL: u32 = 300;

#[derive(Debug, Clone)]
enum StaticAnswer {
    Records(Vec<String>),
    Failure(ToolboxError),
}

/// In-memory resolver answering from a table built up front.
///
/// Names that were never registered answer `NotFound`. Every lookup is
/// counted, which lets callers assert that a cached report did not touch DNS.
///
/// ```rust
/// use dns_posture_toolbox::{DnsQueryType, StaticResolver};
///
/// let resolver = StaticResolver::new()
///     .with_records("example.com", DnsQueryType::Txt, ["v=spf1 -all"])
///     .with_records("example.com", DnsQueryType::Ns, ["a.iana-servers.net", "b.iana-servers.net"]);
/// # let _ = resolver;
/// ```
#[derive(Debug, Default)]
pub struct StaticResolver {
    answers: HashMap<(String, DnsQueryType), StaticAnswer>,
    delays: HashMap<(String, DnsQueryType), Duration>,
    queries: AtomicUsize,
}

impl StaticResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `name`/`record_type` with the given values, in order.
    #[must_use]
    pub fn with_records<I, S>(mut self, name: &str, record_type: DnsQueryType, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.answers
            .insert((normalize_name(name), record_type), StaticAnswer::Records(values));
        self
    }

    /// Fail `name`/`record_type` with `error`.
    #[must_use]
    pub fn with_failure(mut self, name: &str, record_type: DnsQueryType, error: ToolboxError) -> Self {
        self.answers
            .insert((normalize_name(name), record_type), StaticAnswer::Failure(error));
        self
    }

    /// Fail `name`/`record_type` the way an unresponsive server would.
    #[must_use]
    pub fn with_timeout(self, name: &str, record_type: DnsQueryType) -> Self {
        let error = ToolboxError::Timeout(format!("{record_type} lookup for {name} timed out"));
        self.with_failure(name, record_type, error)
    }

    /// Hold the answer for `name`/`record_type` back by `delay`.
    #[must_use]
    pub fn with_delay(mut self, name: &str, record_type: DnsQueryType, delay: Duration) -> Self {
        self.delays.insert((normalize_name(name), record_type), delay);
        self
    }

    /// Number of lookups served so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DnsResolver for StaticResolver {
    async fn lookup(&self, name: &str, record_type: DnsQueryType) -> ToolboxResult<LookupOutcome> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let key = (normalize_name(name), record_type);

        if let Some(delay) = self.delays.get(&key) {
            tokio::time::sleep(*delay).await;
        }

        match self.answers.get(&key) {
            Some(StaticAnswer::Records(values)) if !values.is_empty() => Ok(LookupOutcome::Found(
                values
                    .iter()
                    .map(|value| DnsLookupRecord {
                        record_type,
                        name: key.0.clone(),
                        value: value.clone(),
                        ttl: STATIC_TTL,
                    })
                    .collect(),
            )),
            Some(StaticAnswer::Failure(error)) => Err(error.clone()),
            Some(StaticAnswer::Records(_)) | None => Ok(LookupOutcome::NotFound),
        }
    }
}
