//! Dispatch decorators composed by delegation

use crate::error::TransportError;
use crate::headers::HeaderSet;
use crate::transport::{Dispatch, HttpRequest, HttpResponse, RequestBody};
use async_trait::async_trait;
use clientgen_common::HttpMethod;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const DEFAULT_CAPACITY: usize = 256;

/// Logs every exchange of the wrapped dispatcher
#[derive(Debug, Clone)]
pub struct Logged<D> {
    inner: D,
}

impl<D: Dispatch> Logged<D> {
    pub fn new(inner: D) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

#[async_trait]
impl<D: Dispatch> Dispatch for Logged<D> {
    fn default_headers(&self) -> HeaderSet {
        self.inner.default_headers()
    }

    async fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = request.method.as_str();
        let url = request.url.to_string();
        let started = Instant::now();
        let outcome = self.inner.dispatch(request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(response) => info!(method, url = %url, status = response.status, elapsed_ms, "http exchange"),
            Err(error) => warn!(method, url = %url, elapsed_ms, error = %error, "http exchange failed"),
        }
        outcome
    }
}

/// Caches successful GET responses by URL and headers
///
/// Holds at most `capacity` entries (256 by default); the oldest entry is
/// evicted to make room. Entries never expire unless a TTL is set.
#[derive(Debug)]
pub struct Cached<D> {
    inner: D,
    capacity: usize,
    ttl: Option<Duration>,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    stored: Instant,
    response: HttpResponse,
}

impl<D: Dispatch> Cached<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            capacity: DEFAULT_CAPACITY,
            ttl: None,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Maximum number of cached responses, at least one
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Serve entries only while they are younger than `ttl`
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn invalidate(&self) {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key(request: &HttpRequest) -> Option<String> {
        if request.method != HttpMethod::Get || request.body != RequestBody::Empty {
            return None;
        }
        let mut key = request.url.to_string();
        for (name, value) in request.headers.iter() {
            key.push('\n');
            key.push_str(name);
            key.push(':');
            key.push_str(value);
        }
        Some(key)
    }

    fn lookup(&self, key: &str) -> Option<HttpResponse> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get(key)?;
        if self.ttl.is_some_and(|ttl| entry.stored.elapsed() >= ttl) {
            entries.remove(key);
            return None;
        }
        Some(entry.response.clone())
    }

    fn store(&self, key: String, response: HttpResponse) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                debug!(key = %oldest, "evicting cached response");
                entries.remove(&oldest);
            }
        }
        entries.insert(
            key,
            CacheEntry {
                stored: Instant::now(),
                response,
            },
        );
    }
}

#[async_trait]
impl<D: Dispatch> Dispatch for Cached<D> {
    fn default_headers(&self) -> HeaderSet {
        self.inner.default_headers()
    }

    async fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let Some(key) = Self::key(&request) else {
            return self.inner.dispatch(request).await;
        };
        if let Some(hit) = self.lookup(&key) {
            return Ok(hit);
        }
        let response = self.inner.dispatch(request).await?;
        if (200..300).contains(&response.status) {
            self.store(key, response.clone());
        }
        Ok(response)
    }
}
