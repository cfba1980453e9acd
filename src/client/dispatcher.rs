//! The request dispatcher
//!
//! Every backend call goes through [`Dispatcher::dispatch`], which layers
//! response caching, in-flight de-duplication, and timeout/caller cancellation
//! over a single `reqwest` client.

use futures::FutureExt;
use hyper::ext::ReasonPhrase;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::inflight::{InflightRequests, Registration, SharedResponse, Slot};
use super::{ApiError, RequestOptions};
use crate::cache::{CacheKey, ResponseCache};
use crate::config::ApiConfig;

/// Cloneable handle to a dispatcher; clones share one cache and in-flight map
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    client: Client,
    base_url: String,
    default_timeout: Duration,
    cache: ResponseCache,
    inflight: InflightRequests,
}

/// Everything needed to perform one network call, detached from the caller
struct Call {
    client: Client,
    method: Method,
    url: String,
    endpoint: String,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    timeout: Duration,
}

impl Dispatcher {
    /// Creates a dispatcher with its own HTTP client
    pub fn new(config: ApiConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                client: Client::new(),
                base_url: config.base_url,
                default_timeout: config.timeout,
                cache: ResponseCache::new(config.cache_ttl),
                inflight: InflightRequests::default(),
            }),
        }
    }

    /// Number of cached responses, including expired ones not yet evicted
    pub fn cached_len(&self) -> usize {
        self.inner.cache.len()
    }

    /// Number of cacheable requests currently pending
    pub fn inflight_len(&self) -> usize {
        self.inner.inflight.len()
    }

    /// Sends a request to `endpoint` and returns the parsed JSON response.
    ///
    /// With `use_cache` enabled, a live cached response is returned without a
    /// network call, and a call identical to one still pending joins it
    /// instead of issuing another request. Leaving a joined call (through the
    /// caller's own token) only stops that caller from waiting; the shared
    /// request is cancelled once nobody is waiting for it.
    ///
    /// The request is aborted when the caller's token fires or the timeout
    /// elapses, whichever comes first. Both cases return
    /// [`ApiError::Aborted`].
    pub async fn dispatch(&self, endpoint: &str, options: RequestOptions) -> Result<Value, ApiError> {
        if !options.use_cache {
            if is_cancelled(&options.signal) {
                info!(endpoint, "Request was cancelled by user");
                return Err(ApiError::aborted(endpoint));
            }
            let call = self.prepare(endpoint, &options);
            let cancel = options.signal.clone().unwrap_or_else(CancellationToken::new);
            return execute(call, cancel, options.signal.is_some()).await;
        }

        let key = CacheKey::new(endpoint, options.body.as_deref());

        if let Some(payload) = self.inner.cache.get(&key) {
            debug!(endpoint, "serving response from cache");
            return Ok(payload);
        }

        if is_cancelled(&options.signal) {
            info!(endpoint, "Request was cancelled by user");
            return Err(ApiError::aborted(endpoint));
        }

        let slot = self.inner.inflight.join_or_register(&key, |id, cancel| {
            self.spawn_shared(key.clone(), id, cancel, self.prepare(endpoint, &options))
        });

        let (response, _guard) = match slot {
            Slot::Joined(response, guard) => {
                debug!(endpoint, "joining in-flight request");
                (response, guard)
            }
            Slot::Registered(Registration { response, guard }) => (response, guard),
        };

        match &options.signal {
            None => response.await,
            Some(signal) => {
                tokio::select! {
                    biased;
                    _ = signal.cancelled() => {
                        info!(endpoint, "Request was cancelled by user");
                        Err(ApiError::aborted(endpoint))
                    }
                    result = response => result,
                }
            }
        }
    }

    fn prepare(&self, endpoint: &str, options: &RequestOptions) -> Call {
        Call {
            client: self.inner.client.clone(),
            method: options.method.clone(),
            url: format!("{}{}", self.inner.base_url, endpoint),
            endpoint: endpoint.to_string(),
            headers: options.effective_headers(),
            body: options.body.clone(),
            timeout: options.timeout.unwrap_or(self.inner.default_timeout),
        }
    }

    /// Starts the network call on its own task so it keeps running while any
    /// caller still waits on it, and settles the cache and in-flight map when
    /// it finishes.
    fn spawn_shared(
        &self,
        key: CacheKey,
        id: u64,
        cancel: CancellationToken,
        call: Call,
    ) -> SharedResponse {
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let result = execute(call, cancel, false).await;
            if let Ok(payload) = &result {
                inner.cache.insert(key.clone(), payload.clone());
            }
            inner.inflight.remove(&key, id);
            result
        });

        async move {
            handle
                .await
                .unwrap_or_else(|e| Err(ApiError::Transport(format!("request task failed: {}", e))))
        }
        .boxed()
        .shared()
    }
}

fn is_cancelled(signal: &Option<CancellationToken>) -> bool {
    signal.as_ref().map(|s| s.is_cancelled()).unwrap_or(false)
}

/// Performs one network call, racing it against `cancel` and the timeout.
///
/// `cancel_is_caller` only changes how an abort is logged. The timer is
/// dropped together with the `select!` on every exit path.
async fn execute(call: Call, cancel: CancellationToken, cancel_is_caller: bool) -> Result<Value, ApiError> {
    let endpoint = call.endpoint.clone();
    let timeout = call.timeout;

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            if cancel_is_caller {
                info!(endpoint = %endpoint, "Request was cancelled by user");
            } else {
                debug!(endpoint = %endpoint, "request abandoned by every caller");
            }
            Err(ApiError::aborted(&endpoint))
        }
        _ = tokio::time::sleep(timeout) => {
            warn!(
                endpoint = %endpoint,
                timeout_ms = timeout.as_millis() as u64,
                "Request aborted after timeout"
            );
            Err(ApiError::aborted(&endpoint))
        }
        result = send(call) => {
            if let Err(err) = &result {
                error!(endpoint = %endpoint, error = %err, "API Error");
            }
            result
        }
    }
}

async fn send(call: Call) -> Result<Value, ApiError> {
    let mut request = call
        .client
        .request(call.method, &call.url)
        .headers(call.headers);
    if let Some(body) = call.body {
        request = request.body(body);
    }

    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        let status_text = reason_phrase(&response);
        let body = response.text().await?;
        error!(
            endpoint = %call.endpoint,
            status = status.as_u16(),
            body = %body,
            "API Error Details"
        );
        return Err(ApiError::from_status(status.as_u16(), &status_text, &body));
    }

    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
}

/// The reason phrase the server sent, or the canonical one for the status
fn reason_phrase(response: &reqwest::Response) -> String {
    response
        .extensions()
        .get::<ReasonPhrase>()
        .and_then(|reason| std::str::from_utf8(reason.as_bytes()).ok())
        .or_else(|| response.status().canonical_reason())
        .unwrap_or("")
        .to_string()
}
