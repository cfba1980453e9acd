//! Cache module for storing API responses in memory
//!
//! This module provides a response cache keyed by endpoint and request body,
//! with a fixed TTL (time-to-live). Entries are evicted lazily: an expired
//! entry is dropped the next time it is looked up.

mod manager;

pub use manager::{CacheKey, ResponseCache, DEFAULT_CACHE_TTL, UNSERIALIZABLE_BODY};
