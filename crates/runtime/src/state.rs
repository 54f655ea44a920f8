//! State and request plumbing shared by the OpenAPI and GraphQL clients

use crate::config::{parse_base_url, ClientConfig};
use crate::error::{ClientError, Result};
use crate::headers::{CallInfo, HeaderSet};
use crate::transport::{HttpRequest, HttpResponse};
use serde_json::Value;
use std::sync::{Arc, RwLock};
use tracing::warn;
use url::Url;

/// Holder of the current configuration
///
/// Calls take a snapshot when they start; mutators swap the whole snapshot,
/// so in-flight calls keep the configuration they started with.
pub(crate) struct Core {
    config: RwLock<Arc<ClientConfig>>,
}

impl Core {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config: RwLock::new(Arc::new(config)),
        }
    }

    pub fn config(&self) -> Arc<ClientConfig> {
        let guard = self.config.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    fn update(&self, f: impl FnOnce(&mut ClientConfig)) {
        let mut guard = self.config.write().unwrap_or_else(|e| e.into_inner());
        let mut next = ClientConfig::clone(&guard);
        f(&mut next);
        *guard = Arc::new(next);
    }

    pub fn set_base_url(&self, url: &str) -> Result<()> {
        let base_url = parse_base_url(url.trim())?;
        self.update(|config| config.base_url = base_url);
        Ok(())
    }

    /// Replace the static headers sent with every call
    pub fn set_default_headers(&self, headers: HeaderSet) {
        self.update(|config| config.headers = headers);
    }
}

/// Headers of one call, lowest precedence first: transport defaults, static
/// headers, telemetry, the header provider, header parameters, explicit
/// per-call headers
pub(crate) async fn resolve_headers(
    config: &ClientConfig,
    call: &CallInfo,
    telemetry: &HeaderSet,
    params: &HeaderSet,
    explicit: &HeaderSet,
) -> Result<HeaderSet> {
    let mut headers = config.dispatcher.default_headers();
    headers.merge(&config.headers);
    headers.merge(telemetry);
    if let Some(provider) = &config.header_provider {
        let provided = provider.headers(call).await.map_err(|e| {
            ClientError::unexpected_with(format!("header provider failed for {}", call.operation_id), e)
        })?;
        headers.merge(&provided);
    }
    headers.merge(params);
    headers.merge(explicit);
    Ok(headers)
}

/// Base URL with the given decoded path segments appended and the query set
pub(crate) fn build_url(base: &Url, segments: &[String], query: &str) -> Result<Url> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| ClientError::wrong_option("url", format!("`{}` cannot be a base", base)))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    url.set_query(if query.is_empty() { None } else { Some(query) });
    Ok(url)
}

/// Send a request, retrying transport failures and 5xx responses
///
/// Retries happen only when a retry delay is configured, at most
/// `max_retries` times. The last response or failure is returned.
pub(crate) async fn send_with_retry(config: &ClientConfig, request: HttpRequest) -> Result<HttpResponse> {
    let mut attempt: u32 = 0;
    loop {
        let outcome = config.dispatcher.dispatch(request.clone()).await;
        let retryable = match &outcome {
            Ok(response) => response.status >= 500,
            Err(_) => true,
        };
        let retry_delay = match config.retry_delay {
            Some(delay) if retryable && attempt < config.max_retries => delay,
            _ => return Ok(outcome?),
        };
        match &outcome {
            Ok(response) => warn!(
                url = %request.url,
                status = response.status,
                attempt = attempt + 1,
                "server error, retrying"
            ),
            Err(error) => warn!(
                url = %request.url,
                attempt = attempt + 1,
                error = %error,
                "request failed, retrying"
            ),
        }
        attempt += 1;
        tokio::time::sleep(retry_delay).await;
    }
}

/// Failure raised for an error status when `throw_on_error` is set
pub(crate) fn status_failure(status_code: u16, body: Value) -> ClientError {
    ClientError::UnexpectedCallFailure {
        message: format!("request failed with status {}", status_code),
        status_code: Some(status_code),
        body: Some(body),
        source: None,
    }
}
