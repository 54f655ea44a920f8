//! OpenAPI client: binds, sends and validates operation calls

use crate::bind::{bind, CallArgs};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::headers::{CallInfo, HeaderSet};
use crate::state::{build_url, resolve_headers, send_with_retry, status_failure, Core};
use crate::transport::HttpRequest;
use crate::validate::{decode_body, validate_response};
use clientgen_common::{ApiDefinition, Route};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, Span};

/// Response envelope returned in full-response mode
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullResponse {
    pub status_code: u16,
    pub headers: HeaderSet,
    pub body: Value,
}

/// Result of a call: the bare body, or the full envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CallOutput {
    Body(Value),
    Full(FullResponse),
}

impl CallOutput {
    pub fn body(&self) -> &Value {
        match self {
            CallOutput::Body(body) => body,
            CallOutput::Full(full) => &full.body,
        }
    }

    pub fn into_body(self) -> Value {
        match self {
            CallOutput::Body(body) => body,
            CallOutput::Full(full) => full.body,
        }
    }

    /// Status code, known only for full envelopes
    pub fn status_code(&self) -> Option<u16> {
        match self {
            CallOutput::Body(_) => None,
            CallOutput::Full(full) => Some(full.status_code),
        }
    }

    pub fn full(&self) -> Option<&FullResponse> {
        match self {
            CallOutput::Body(_) => None,
            CallOutput::Full(full) => Some(full),
        }
    }

    /// Deserialize the body into a caller type
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(self.into_body())
            .map_err(|e| ClientError::unexpected_with("response body does not match the requested type", e))
    }
}

/// Client for the operations of one OpenAPI definition
///
/// Cloning is cheap; clones share the definition and the configuration.
#[derive(Clone)]
pub struct OpenApiClient {
    api: Arc<ApiDefinition>,
    core: Arc<Core>,
}

impl OpenApiClient {
    pub fn new(api: ApiDefinition, config: ClientConfig) -> Self {
        Self {
            api: Arc::new(api),
            core: Arc::new(Core::new(config)),
        }
    }

    pub fn api(&self) -> &ApiDefinition {
        &self.api
    }

    /// Configuration snapshot the next call would use
    pub fn config(&self) -> Arc<ClientConfig> {
        self.core.config()
    }

    /// Operation id to `{path, method}`
    pub fn routes(&self) -> BTreeMap<String, Route> {
        self.api.routes()
    }

    /// Point subsequent calls at another server
    pub fn set_base_url(&self, url: &str) -> Result<()> {
        self.core.set_base_url(url)
    }

    /// Replace the static headers of subsequent calls
    pub fn set_default_headers(&self, headers: HeaderSet) {
        self.core.set_default_headers(headers)
    }

    /// Call an operation by id
    ///
    /// Binding errors are raised before any I/O. With `throw_on_error`
    /// (the default) error statuses raise `UnexpectedCallFailure`; otherwise
    /// they come back as a [`FullResponse`].
    #[instrument(
        name = "api_request",
        skip(self, args),
        fields(
            http.method = tracing::field::Empty,
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty,
            otel.kind = "client",
            otel.status_code = tracing::field::Empty,
        )
    )]
    pub async fn invoke(&self, operation_id: &str, args: impl Into<CallArgs>) -> Result<CallOutput> {
        let args = args.into();
        let config = self.core.config();
        let op = self
            .api
            .operation(operation_id)
            .ok_or_else(|| ClientError::unexpected(format!("unknown operation `{}`", operation_id)))?;
        Span::current().record("http.method", op.method.as_str());

        let bound = bind(op, &self.api.types, &args, config.full_request)?;

        let call = CallInfo {
            operation_id: op.id.clone(),
            method: op.method,
            path: op.path.clone(),
            incoming: args.incoming.clone(),
        };
        let headers = resolve_headers(&config, &call, &args.telemetry, &bound.headers, &args.headers).await?;
        let query = config.query_serializer.serialize(&bound.query);
        let url = build_url(&config.base_url, &bound.segments, &query)?;
        Span::current().record("http.url", url.as_str());

        let request = HttpRequest {
            method: op.method,
            url,
            headers,
            body: bound.body,
            headers_timeout: config.headers_timeout,
            body_timeout: config.body_timeout,
        };
        let response = send_with_retry(&config, request).await?;
        let status_code = response.status;
        Span::current().record("http.status_code", status_code);
        Span::current().record("otel.status_code", if status_code >= 500 { "ERROR" } else { "OK" });
        debug!(operation = %op.id, status = status_code, "response received");

        if status_code >= 400 && config.throw_on_error {
            return Err(status_failure(status_code, decode_body(&response)));
        }

        let body = if config.validate_response {
            validate_response(op, &self.api.types, &response)?
        } else {
            decode_body(&response)
        };

        if config.full_response || status_code >= 400 {
            Ok(CallOutput::Full(FullResponse {
                status_code,
                headers: response.headers,
                body,
            }))
        } else {
            Ok(CallOutput::Body(body))
        }
    }

    /// Call an operation and deserialize its body
    pub async fn invoke_as<T: DeserializeOwned>(&self, operation_id: &str, args: impl Into<CallArgs>) -> Result<T> {
        self.invoke(operation_id, args).await?.deserialize()
    }
}

impl fmt::Debug for OpenApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenApiClient")
            .field("title", &self.api.title)
            .field("operations", &self.api.operations.len())
            .field("base_url", &self.core.config().base_url.as_str())
            .finish()
    }
}
