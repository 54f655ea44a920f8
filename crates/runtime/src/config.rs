//! Client options and the resolved client configuration

use crate::error::{ClientError, Result};
use crate::headers::{HeaderProvider, HeaderSet};
use crate::query::{QuerySerializer, RepeatedKeySerializer};
use crate::transport::{Dispatch, ReqwestDispatcher};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const DEFAULT_HEADERS_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_BODY_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_GRAPHQL_PATH: &str = "/graphql";

/// Options a host passes when building a client
///
/// Keys are camelCase; unknown keys are rejected with `WrongOptionType`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClientOptions {
    /// Base URL every operation path is appended to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Local schema file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Remote schema location, used when no local path is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_url: Option<String>,
    #[serde(default)]
    pub headers: HeaderSet,
    #[serde(default)]
    pub full_response: bool,
    #[serde(default)]
    pub full_request: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throw_on_error: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate_response: Option<bool>,
    /// Milliseconds to wait for the response body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_timeout: Option<u64>,
    /// Milliseconds to wait for response headers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers_timeout: Option<u64>,
    /// Delay between attempts; retries are off when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graphql_path: Option<String>,
}

impl ClientOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Options from a JSON object, as a host would pass them
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(option_error)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(option_error)
    }
}

/// Map a deserialization failure to the option it names
fn option_error(error: serde_json::Error) -> ClientError {
    let message = error.to_string();
    let option = message
        .split('`')
        .nth(1)
        .filter(|_| message.starts_with("unknown field"))
        .unwrap_or("options")
        .to_string();
    ClientError::WrongOptionType { option, message }
}

/// Resolved, immutable configuration shared by every call of a client
#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub headers: HeaderSet,
    pub full_request: bool,
    pub full_response: bool,
    pub throw_on_error: bool,
    pub validate_response: bool,
    pub headers_timeout: Duration,
    pub body_timeout: Duration,
    /// Delay between attempts; `None` disables retries
    pub retry_delay: Option<Duration>,
    pub max_retries: u32,
    pub graphql_path: String,
    pub header_provider: Option<Arc<dyn HeaderProvider>>,
    pub query_serializer: Arc<dyn QuerySerializer>,
    pub dispatcher: Arc<dyn Dispatch>,
}

impl ClientConfig {
    pub fn builder(options: ClientOptions) -> ClientConfigBuilder {
        ClientConfigBuilder::new(options)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("headers", &self.headers)
            .field("full_request", &self.full_request)
            .field("full_response", &self.full_response)
            .field("throw_on_error", &self.throw_on_error)
            .field("validate_response", &self.validate_response)
            .field("headers_timeout", &self.headers_timeout)
            .field("body_timeout", &self.body_timeout)
            .field("retry_delay", &self.retry_delay)
            .field("max_retries", &self.max_retries)
            .field("graphql_path", &self.graphql_path)
            .field("header_provider", &self.header_provider.is_some())
            .finish_non_exhaustive()
    }
}

/// Builds a [`ClientConfig`] from options plus the hooks that cannot be
/// expressed as plain values
pub struct ClientConfigBuilder {
    options: ClientOptions,
    header_provider: Option<Arc<dyn HeaderProvider>>,
    query_serializer: Option<Arc<dyn QuerySerializer>>,
    dispatcher: Option<Arc<dyn Dispatch>>,
}

impl ClientConfigBuilder {
    pub fn new(options: ClientOptions) -> Self {
        Self {
            options,
            header_provider: None,
            query_serializer: None,
            dispatcher: None,
        }
    }

    /// Dynamic per-call headers (`getHeaders`)
    pub fn header_provider(mut self, provider: Arc<dyn HeaderProvider>) -> Self {
        self.header_provider = Some(provider);
        self
    }

    /// Query string encoding (`queryParser`)
    pub fn query_serializer(mut self, serializer: Arc<dyn QuerySerializer>) -> Self {
        self.query_serializer = Some(serializer);
        self
    }

    /// Transport (`dispatcher`)
    pub fn dispatcher(mut self, dispatcher: Arc<dyn Dispatch>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn build(self) -> Result<ClientConfig> {
        let options = self.options;
        let raw_url = options
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(ClientError::OptionsUrlRequired)?;
        let base_url = parse_base_url(raw_url)?;

        let headers_timeout = timeout_option("headersTimeout", options.headers_timeout, DEFAULT_HEADERS_TIMEOUT_MS)?;
        let body_timeout = timeout_option("bodyTimeout", options.body_timeout, DEFAULT_BODY_TIMEOUT_MS)?;

        let graphql_path = options
            .graphql_path
            .unwrap_or_else(|| DEFAULT_GRAPHQL_PATH.to_string());
        if !graphql_path.starts_with('/') {
            return Err(ClientError::wrong_option(
                "graphqlPath",
                format!("`{}` must start with `/`", graphql_path),
            ));
        }

        let dispatcher = match self.dispatcher {
            Some(dispatcher) => dispatcher,
            None => Arc::new(
                ReqwestDispatcher::new()
                    .map_err(|e| ClientError::unexpected_with("failed to build HTTP client", e))?,
            ),
        };

        Ok(ClientConfig {
            base_url,
            headers: options.headers,
            full_request: options.full_request,
            full_response: options.full_response,
            throw_on_error: options.throw_on_error.unwrap_or(true),
            validate_response: options.validate_response.unwrap_or(true),
            headers_timeout,
            body_timeout,
            retry_delay: options.retry_timeout_ms.map(Duration::from_millis),
            max_retries: options.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            graphql_path,
            header_provider: self.header_provider,
            query_serializer: self
                .query_serializer
                .unwrap_or_else(|| Arc::new(RepeatedKeySerializer)),
            dispatcher,
        })
    }
}

impl From<ClientOptions> for ClientConfigBuilder {
    fn from(options: ClientOptions) -> Self {
        ClientConfigBuilder::new(options)
    }
}

/// Absolute http(s) URL
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| ClientError::wrong_option("url", format!("`{}`: {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ClientError::wrong_option(
            "url",
            format!("`{}` is not an http(s) URL", raw),
        ));
    }
    Ok(url)
}

fn timeout_option(name: &str, value: Option<u64>, default_ms: u64) -> Result<Duration> {
    match value {
        Some(0) => Err(ClientError::wrong_option(name, "must be greater than zero")),
        Some(ms) => Ok(Duration::from_millis(ms)),
        None => Ok(Duration::from_millis(default_ms)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_options_from_camel_case() {
        let options = ClientOptions::from_value(json!({
            "url": "http://localhost:3042",
            "headers": {"X-Api-Key": "k"},
            "fullResponse": true,
            "throwOnError": false,
            "retryTimeoutMs": 10,
            "maxRetries": 2
        }))
        .unwrap();
        assert_eq!(options.url.as_deref(), Some("http://localhost:3042"));
        assert_eq!(options.headers.get("x-api-key"), Some("k"));
        assert!(options.full_response);
        assert_eq!(options.throw_on_error, Some(false));
        assert_eq!(options.retry_timeout_ms, Some(10));
        assert_eq!(options.max_retries, Some(2));
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        let error = ClientOptions::from_value(json!({"url": "http://x", "retries": 3})).unwrap_err();
        match error {
            ClientError::WrongOptionType { option, .. } => assert_eq!(option, "retries"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_wrongly_typed_option() {
        let error = ClientOptions::from_json(r#"{"url": "http://x", "fullResponse": "yes"}"#).unwrap_err();
        assert_eq!(error.code(), "WRONG_OPTION_TYPE");
    }

    #[test]
    fn test_url_is_required() {
        let error = ClientConfig::builder(ClientOptions::default()).build().unwrap_err();
        assert!(matches!(error, ClientError::OptionsUrlRequired));

        let error = ClientConfig::builder(ClientOptions::new("  ")).build().unwrap_err();
        assert!(matches!(error, ClientError::OptionsUrlRequired));
    }

    #[test]
    fn test_invalid_url() {
        let error = ClientConfig::builder(ClientOptions::new("not a url")).build().unwrap_err();
        assert_eq!(error.code(), "WRONG_OPTION_TYPE");

        let error = ClientConfig::builder(ClientOptions::new("mailto:someone@example.com"))
            .build()
            .unwrap_err();
        assert_eq!(error.code(), "WRONG_OPTION_TYPE");
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::builder(ClientOptions::new("http://localhost:3042/api"))
            .build()
            .unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:3042/api");
        assert!(config.throw_on_error);
        assert!(config.validate_response);
        assert!(!config.full_request);
        assert_eq!(config.retry_delay, None);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.headers_timeout, Duration::from_secs(30));
        assert_eq!(config.graphql_path, "/graphql");
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let options = ClientOptions {
            body_timeout: Some(0),
            ..ClientOptions::new("http://localhost")
        };
        let error = ClientConfig::builder(options).build().unwrap_err();
        match error {
            ClientError::WrongOptionType { option, .. } => assert_eq!(option, "bodyTimeout"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
