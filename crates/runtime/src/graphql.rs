//! GraphQL pass-through client

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::headers::{CallInfo, HeaderSet};
use crate::plugin::RequestContext;
use crate::state::{build_url, resolve_headers, send_with_retry, Core};
use crate::transport::{HttpRequest, RequestBody};
use crate::validate::decode_body;
use clientgen_common::{ApiDefinition, HttpMethod};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, Span};

/// One GraphQL request
#[derive(Debug, Clone, Default)]
pub struct GraphqlRequest {
    pub query: String,
    pub variables: Option<Value>,
    /// Explicit headers, overriding every other source
    pub headers: HeaderSet,
    pub(crate) incoming: HeaderSet,
    pub(crate) telemetry: HeaderSet,
}

impl GraphqlRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn variables(mut self, variables: Value) -> Self {
        self.variables = Some(variables);
        self
    }

    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Make the request on behalf of an inbound request
    pub fn context(mut self, context: &RequestContext) -> Self {
        self.incoming = context.headers().clone();
        self.telemetry = context.telemetry().clone();
        self
    }
}

impl From<&str> for GraphqlRequest {
    fn from(query: &str) -> Self {
        GraphqlRequest::new(query)
    }
}

/// Forwards queries to a GraphQL endpoint without per-query validation
#[derive(Clone)]
pub struct GraphqlClient {
    api: Option<Arc<ApiDefinition>>,
    core: Arc<Core>,
}

impl GraphqlClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            api: None,
            core: Arc::new(Core::new(config)),
        }
    }

    /// Client that also carries the introspected schema
    pub fn with_schema(api: ApiDefinition, config: ClientConfig) -> Self {
        Self {
            api: Some(Arc::new(api)),
            core: Arc::new(Core::new(config)),
        }
    }

    pub fn api(&self) -> Option<&ApiDefinition> {
        self.api.as_deref()
    }

    pub fn config(&self) -> Arc<ClientConfig> {
        self.core.config()
    }

    pub fn set_base_url(&self, url: &str) -> Result<()> {
        self.core.set_base_url(url)
    }

    pub fn set_default_headers(&self, headers: HeaderSet) {
        self.core.set_default_headers(headers)
    }

    /// Send a query and return its `data`
    ///
    /// A non-empty `errors` array raises `UnexpectedCallFailure` carrying the
    /// list as its body.
    #[instrument(
        name = "graphql_request",
        skip(self, request),
        fields(
            http.method = "POST",
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty,
            otel.kind = "client",
        )
    )]
    pub async fn graphql(&self, request: impl Into<GraphqlRequest>) -> Result<Value> {
        let request = request.into();
        let config = self.core.config();
        let call = CallInfo {
            operation_id: "graphql".to_string(),
            method: HttpMethod::Post,
            path: config.graphql_path.clone(),
            incoming: request.incoming.clone(),
        };
        let headers = resolve_headers(&config, &call, &request.telemetry, &HeaderSet::new(), &request.headers).await?;

        let segments: Vec<String> = config
            .graphql_path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let url = build_url(&config.base_url, &segments, "")?;
        Span::current().record("http.url", url.as_str());

        let mut payload = json!({ "query": request.query });
        if let Some(variables) = request.variables {
            payload["variables"] = variables;
        }
        let http = HttpRequest {
            method: HttpMethod::Post,
            url,
            headers,
            body: RequestBody::Json(payload),
            headers_timeout: config.headers_timeout,
            body_timeout: config.body_timeout,
        };
        let response = send_with_retry(&config, http).await?;
        Span::current().record("http.status_code", response.status);

        let mut body = decode_body(&response);
        if let Some(errors) = body.get("errors").filter(|e| e.as_array().is_some_and(|list| !list.is_empty())) {
            debug!(status = response.status, "graphql errors returned");
            let count = errors.as_array().map_or(0, Vec::len);
            return Err(ClientError::UnexpectedCallFailure {
                message: format!("graphql request returned {} error(s)", count),
                status_code: Some(response.status),
                body: Some(errors.clone()),
                source: None,
            });
        }
        if response.status >= 400 {
            return Err(ClientError::UnexpectedCallFailure {
                message: format!("graphql request failed with status {}", response.status),
                status_code: Some(response.status),
                body: Some(body),
                source: None,
            });
        }
        Ok(body.get_mut("data").map(Value::take).unwrap_or(Value::Null))
    }

    /// Send a query and deserialize `data` into a caller type
    pub async fn graphql_as<T: DeserializeOwned>(&self, request: impl Into<GraphqlRequest>) -> Result<T> {
        let data = self.graphql(request).await?;
        serde_json::from_value(data)
            .map_err(|e| ClientError::unexpected_with("graphql data does not match the requested type", e))
    }
}

impl fmt::Debug for GraphqlClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.core.config();
        f.debug_struct("GraphqlClient")
            .field("base_url", &config.base_url.as_str())
            .field("graphql_path", &config.graphql_path)
            .field("schema", &self.api.is_some())
            .finish()
    }
}
