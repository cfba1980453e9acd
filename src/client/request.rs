//! Per-call request options

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::ApiError;

/// Options recognized on every dispatched call
///
/// Defaults to a `GET` with no body, no caching, no caller cancellation and
/// the dispatcher's default timeout.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub(crate) method: Method,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<Vec<u8>>,
    pub(crate) signal: Option<CancellationToken>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) use_cache: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
            signal: None,
            timeout: None,
            use_cache: false,
        }
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a `POST` request
    pub fn post() -> Self {
        Self::default().method(Method::POST)
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Adds a header, replacing any default with the same name
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets a raw request body
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serializes `value` as the JSON request body
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_vec(value)?);
        Ok(self)
    }

    /// Attaches a caller cancellation token
    pub fn signal(mut self, token: CancellationToken) -> Self {
        self.signal = Some(token);
        self
    }

    /// Overrides the dispatcher's default timeout for this call
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enables response caching and in-flight de-duplication
    pub fn use_cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }

    /// Headers to send: `Content-Type: application/json` overlaid with the
    /// caller's own headers
    pub(crate) fn effective_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &self.headers {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options = RequestOptions::new();
        assert_eq!(options.method, Method::GET);
        assert!(options.body.is_none());
        assert!(options.signal.is_none());
        assert!(options.timeout.is_none());
        assert!(!options.use_cache);
    }

    #[test]
    fn test_json_body_is_serialized() {
        let options = RequestOptions::post().json(&json!({"query": "tai nghe"})).unwrap();
        assert_eq!(options.method, Method::POST);
        assert_eq!(options.body.as_deref(), Some(br#"{"query":"tai nghe"}"#.as_slice()));
    }

    #[test]
    fn test_content_type_defaults_to_json() {
        let headers = RequestOptions::new().effective_headers();
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn test_caller_headers_override_defaults() {
        let headers = RequestOptions::new()
            .header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .header(
                HeaderName::from_static("x-request-id"),
                HeaderValue::from_static("abc"),
            )
            .effective_headers();
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(headers.get("x-request-id").unwrap(), "abc");
    }
}
