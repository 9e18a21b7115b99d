//! Caps how many lookups run at once through a shared resolver.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use super::DnsResolver;
use crate::error::{ToolboxError, ToolboxResult};
use crate::types::{DnsQueryType, LookupOutcome};

/// Wraps a resolver so that at most `max_in_flight` lookups are outstanding.
///
/// A permit is held for the whole lookup, retries and backoff included.
/// Build one per report so that concurrent reports do not share a budget.
pub struct BoundedResolver {
    inner: Arc<dyn DnsResolver>,
    permits: Semaphore,
}

impl BoundedResolver {
    /// A `max_in_flight` of zero is treated as one.
    pub fn new(inner: Arc<dyn DnsResolver>, max_in_flight: usize) -> Self {
        Self {
            inner,
            permits: Semaphore::new(max_in_flight.max(1)),
        }
    }
}

#[async_trait]
impl DnsResolver for BoundedResolver {
    async fn lookup(&self, name: &str, record_type: DnsQueryType) -> ToolboxResult<LookupOutcome> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| ToolboxError::NetworkError(format!("{record_type} lookup for {name}: {e}")))?;
        self.inner.lookup(name, record_type).await
    }
}
