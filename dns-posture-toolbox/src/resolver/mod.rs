//! DNS resolver adapter.
//!
//! Analyzers talk to DNS exclusively through [`DnsResolver`], which returns a
//! tri-state result: records, authoritative absence, or a transport error.

mod bounded;
mod hickory;
mod static_resolver;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ToolboxResult;
use crate::types::{DnsQueryType, LookupOutcome};

pub use bounded::BoundedResolver;
pub use hickory::HickoryDnsResolver;
pub use static_resolver::StaticResolver;

/// Default per-attempt query timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of retries after the first attempt.
pub const DEFAULT_RETRIES: u32 = 3;

/// Default cap on lookups one report may have in flight.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 12;

/// Record lookup capability.
///
/// Implementations:
/// - [`HickoryDnsResolver`]: real queries through the system (or a given) nameserver
/// - [`StaticResolver`]: fixed answer table for fixtures and offline runs
/// - [`BoundedResolver`]: concurrency cap around another resolver
#[async_trait]
pub trait DnsResolver: Send + Sync {
    /// Look up `name` (no trailing dot required) for `record_type`.
    ///
    /// # Returns
    /// * `Ok(LookupOutcome::Found(..))` - at least one record of that type
    /// * `Ok(LookupOutcome::NotFound)` - NXDOMAIN or empty answer; never retried
    /// * `Err(ToolboxError::Timeout | ToolboxError::NetworkError)` - after retries ran out
    async fn lookup(&self, name: &str, record_type: DnsQueryType) -> ToolboxResult<LookupOutcome>;
}

/// Run `attempt` until it succeeds, fails permanently, or `max_retries` retries
/// have been spent.
///
/// # Retry strategy
/// - Only transient errors (`Timeout`, `NetworkError`) are retried
/// - `NotFound` is a successful answer and returns immediately
/// - Exponential backoff: 100ms, 200ms, 400ms, ... (maximum 10 seconds)
pub async fn retry_transient<F, Fut>(
    label: &str,
    max_retries: u32,
    mut attempt: F,
) -> ToolboxResult<LookupOutcome>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ToolboxResult<LookupOutcome>>,
{
    let mut tries = 0;
    loop {
        match attempt().await {
            Err(e) if tries < max_retries && e.is_retryable() => {
                let delay = backoff_delay(tries);
                log::warn!(
                    "[dns] {label} failed (attempt {}/{}), retrying in {:.1}s: {e}",
                    tries + 1,
                    max_retries + 1,
                    delay.as_secs_f32(),
                );
                tokio::time::sleep(delay).await;
                tries += 1;
            }
            other => return other,
        }
    }
}

/// Calculate exponential backoff delay
///
/// Backoff strategy: 100ms, 200ms, 400ms, 800ms, 1.6s, ...
/// Maximum delay limit is 10 seconds
pub(crate) fn backoff_delay(attempt: u32) -> Duration {
    let capped_attempt = attempt.min(20); // Prevent 2^attempt from overflowing
    let delay_ms = 100_u64.saturating_mul(1_u64 << capped_attempt);
    let delay_ms = delay_ms.min(10_000);
    Duration::from_millis(delay_ms)
}

/// Lowercase and strip the trailing dot so names compare equal.
pub(crate) fn normalize_name(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}
