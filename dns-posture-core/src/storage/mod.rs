//! Persistent implementations of the storage traits.

mod file_cache_store;

pub use file_cache_store::FileCacheStore;
