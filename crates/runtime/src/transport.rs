//! HTTP exchange seam and its reqwest implementation

use crate::error::TransportError;
use crate::headers::HeaderSet;
use async_trait::async_trait;
use clientgen_common::HttpMethod;
use reqwest::multipart;
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

/// One field of a multipart form
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    File {
        file_name: String,
        content_type: Option<String>,
        bytes: Vec<u8>,
    },
}

/// Multipart form body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    fields: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), FormValue::Text(value.into())));
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: Option<&str>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        self.fields.push((
            name.into(),
            FormValue::File {
                file_name: file_name.into(),
                content_type: content_type.map(str::to_string),
                bytes: bytes.into(),
            },
        ));
        self
    }

    pub fn fields(&self) -> &[(String, FormValue)] {
        &self.fields
    }

    fn into_multipart(self) -> Result<multipart::Form, TransportError> {
        let mut form = multipart::Form::new();
        for (name, value) in self.fields {
            form = match value {
                FormValue::Text(text) => form.text(name, text),
                FormValue::File {
                    file_name,
                    content_type,
                    bytes,
                } => {
                    let mut part = multipart::Part::bytes(bytes).file_name(file_name);
                    if let Some(content_type) = content_type {
                        part = part.mime_str(&content_type).map_err(|e| {
                            TransportError::Other(format!("invalid content type {}: {}", content_type, e))
                        })?;
                    }
                    form.part(name, part)
                }
            };
        }
        Ok(form)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Form(FormData),
    /// Encoded `application/x-www-form-urlencoded` pairs
    FormUrlEncoded(String),
    /// Any other declared media type, sent as is
    Raw { content_type: String, bytes: Vec<u8> },
}

/// A fully bound request, ready to send
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: HeaderSet,
    pub body: RequestBody,
    pub headers_timeout: Duration,
    pub body_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderSet,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type")
    }
}

/// Sends one request and returns its response
///
/// Decorators wrap another `Dispatch` and delegate to it.
#[async_trait]
pub trait Dispatch: Send + Sync {
    /// Headers every request starts from, overridden by everything else
    fn default_headers(&self) -> HeaderSet;

    async fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Default dispatcher on a pooled reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestDispatcher {
    client: reqwest::Client,
}

impl ReqwestDispatcher {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Dispatch for ReqwestDispatcher {
    fn default_headers(&self) -> HeaderSet {
        HeaderSet::new().with(
            "user-agent",
            concat!("clientgen/", env!("CARGO_PKG_VERSION")),
        )
    }

    async fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| TransportError::Other(format!("invalid method: {}", e)))?;
        let mut builder = self.client.request(method, request.url);
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        let typed = request.headers.contains("content-type");
        let with_type = |builder: reqwest::RequestBuilder, content_type: &str| {
            if typed {
                builder
            } else {
                builder.header(reqwest::header::CONTENT_TYPE, content_type)
            }
        };
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Form(form) => builder.multipart(form.into_multipart()?),
            RequestBody::FormUrlEncoded(text) => {
                with_type(builder, "application/x-www-form-urlencoded").body(text)
            }
            RequestBody::Raw {
                content_type,
                bytes,
            } => with_type(builder, &content_type).body(bytes),
        };

        let response = timeout(request.headers_timeout, builder.send())
            .await
            .map_err(|_| TransportError::HeadersTimeout(request.headers_timeout))??;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v.to_string())))
            .collect();
        let body = timeout(request.body_timeout, response.bytes())
            .await
            .map_err(|_| TransportError::BodyTimeout(request.body_timeout))??;

        Ok(HttpResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_builder() {
        let form = FormData::new()
            .text("caption", "poster")
            .file("file", "poster.png", Some("image/png"), vec![1, 2, 3]);
        assert_eq!(form.fields().len(), 2);
        assert_eq!(form.fields()[0], ("caption".to_string(), FormValue::Text("poster".to_string())));
        assert!(form.into_multipart().is_ok());
    }

    #[test]
    fn test_invalid_part_content_type() {
        let form = FormData::new().file("file", "a.bin", Some("not a mime"), vec![0]);
        assert!(matches!(form.into_multipart(), Err(TransportError::Other(_))));
    }

    #[test]
    fn test_default_headers_carry_user_agent() {
        let dispatcher = ReqwestDispatcher::new().unwrap();
        let headers = dispatcher.default_headers();
        assert!(headers.get("user-agent").unwrap().starts_with("clientgen/"));
    }
}
