//! DNS Posture Core Library
//!
//! Turns a domain name into a scored posture report:
//! - Check orchestration with a shared deadline (`CheckService`)
//! - Report caching and per-client rate limiting over a `CacheStore`
//! - Weighted scoring with strengths / improvements / risks
//!
//! Storage and time are abstracted through traits so the web layer (and
//! tests) decide where reports live and which clock is used.

pub mod config;
pub mod error;
pub mod services;
pub mod storage;
pub mod traits;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use config::{CacheConfig, CheckConfig, RateLimitConfig, ZoneTransferConfig};
pub use error::{CoreError, CoreResult};
pub use services::{CheckService, RateDecision, RateLimiter, ScoreCard, ServiceContext};
pub use storage::FileCacheStore;
pub use traits::{CacheEntry, CacheStore, Clock, InMemoryCacheStore, ManualClock, SystemClock};
pub use types::{ApiResponse, CheckReport, CheckRequest, RateState};
