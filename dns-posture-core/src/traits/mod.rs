//! Abstraction layer Trait definition
//!
//! Storage and time are injected so platforms (and tests) can swap them.

mod cache_store;
mod clock;

pub use cache_store::{CacheEntry, CacheStore, InMemoryCacheStore};
pub use clock::{Clock, ManualClock, SystemClock};
