//! In-memory response cache with lazy TTL eviction
//!
//! Provides a `ResponseCache` that stores JSON payloads under a [`CacheKey`]
//! together with the instant they were inserted. Entries older than the
//! configured TTL are never returned and are evicted on the next lookup.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Placeholder used in place of a body that cannot be rendered as text.
///
/// Every such request to the same endpoint maps onto the same key.
pub const UNSERIALIZABLE_BODY: &str = "[unserializable]";

/// Default time-to-live for cached responses (10 minutes)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// Deterministic identifier for a request: endpoint path plus serialized body
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Builds the key for an endpoint and an optional raw request body.
    ///
    /// A missing body is keyed as `{}`; a body that is not valid UTF-8 falls
    /// back to [`UNSERIALIZABLE_BODY`].
    pub fn new(endpoint: &str, body: Option<&[u8]>) -> Self {
        let body = match body {
            None => "{}",
            Some(bytes) => std::str::from_utf8(bytes).unwrap_or(UNSERIALIZABLE_BODY),
        };
        Self(format!("{}|{}", endpoint, body))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A cached payload and when it was stored
#[derive(Debug, Clone)]
struct CacheEntry {
    /// When the payload was inserted
    timestamp: Instant,
    /// The cached response body
    payload: Value,
}

/// Thread-safe response cache keyed by [`CacheKey`]
///
/// The lock is only held for the duration of a single map operation and
/// never across an `.await`.
#[derive(Debug)]
pub struct ResponseCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl ResponseCache {
    /// Creates an empty cache whose entries live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Returns the configured time-to-live
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Reads a live entry from the cache
    ///
    /// Returns `None` if the key is missing. An expired entry is removed and
    /// `None` is returned.
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        let entry = entries.get(key)?;
        if entry.timestamp.elapsed() < self.ttl {
            return Some(entry.payload.clone());
        }
        entries.remove(key);
        None
    }

    /// Stores a payload with the current instant as its timestamp
    pub fn insert(&self, key: CacheKey, payload: Value) {
        let entry = CacheEntry {
            timestamp: Instant::now(),
            payload,
        };
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key, entry);
    }

    /// Number of entries currently held, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread;

    fn key(endpoint: &str, body: &str) -> CacheKey {
        CacheKey::new(endpoint, Some(body.as_bytes()))
    }

    #[test]
    fn test_key_combines_endpoint_and_body() {
        let k = key("/chat", r#"{"model":"gpt-4o-mini"}"#);
        assert_eq!(k.as_str(), r#"/chat|{"model":"gpt-4o-mini"}"#);
    }

    #[test]
    fn test_key_without_body_uses_empty_object() {
        let k = CacheKey::new("/health", None);
        assert_eq!(k.to_string(), "/health|{}");
    }

    #[test]
    fn test_identical_requests_share_a_key() {
        assert_eq!(key("/chat", "abc"), key("/chat", "abc"));
        assert_ne!(key("/chat", "abc"), key("/query", "abc"));
        assert_ne!(key("/chat", "abc"), key("/chat", "abd"));
    }

    #[test]
    fn test_non_utf8_bodies_collide_on_sentinel() {
        let a = CacheKey::new("/chat", Some(&[0xff_u8, 0xfe][..]));
        let b = CacheKey::new("/chat", Some(&[0xc3_u8, 0x28][..]));
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "/chat|[unserializable]");
    }

    #[test]
    fn test_get_returns_none_for_missing_key() {
        let cache = ResponseCache::default();
        assert!(cache.get(&key("/chat", "missing")).is_none());
    }

    #[test]
    fn test_get_returns_fresh_payload() {
        let cache = ResponseCache::default();
        let payload = json!({"answer": "fresh"});
        cache.insert(key("/chat", "q"), payload.clone());

        assert_eq!(cache.get(&key("/chat", "q")), Some(payload));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entry_is_evicted_on_lookup() {
        let cache = ResponseCache::new(Duration::from_millis(5));
        cache.insert(key("/chat", "q"), json!({"answer": "stale"}));

        thread::sleep(Duration::from_millis(20));

        assert!(cache.get(&key("/chat", "q")).is_none());
        assert!(cache.is_empty(), "Expired entry should be removed");
    }

    #[test]
    fn test_overwrite_existing_entry() {
        let cache = ResponseCache::default();
        cache.insert(key("/chat", "q"), json!(1));
        cache.insert(key("/chat", "q"), json!(2));

        assert_eq!(cache.get(&key("/chat", "q")), Some(json!(2)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_default_ttl_is_ten_minutes() {
        assert_eq!(ResponseCache::default().ttl(), Duration::from_secs(600));
    }
}
