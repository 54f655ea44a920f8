//! Error taxonomy of the runtime dispatcher

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Boxed error produced by caller-supplied hooks
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors raised while constructing a client or running a call
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("options.url is required")]
    OptionsUrlRequired,

    #[error("invalid value for `{option}`: {message}")]
    WrongOptionType { option: String, message: String },

    #[error("missing required parameter `{param}` for operation {operation}")]
    MissingParamsRequired { operation: String, param: String },

    #[error("operation {operation} expects a multipart form body")]
    FormDataRequired { operation: String },

    #[error("no response schema of operation {operation} matches status {status_code}")]
    InvalidResponseSchema { operation: String, status_code: u16 },

    #[error(
        "unexpected content type `{content_type}` for status {status_code} of operation {operation}, expected one of {expected:?}"
    )]
    InvalidContentType {
        operation: String,
        status_code: u16,
        content_type: String,
        expected: Vec<String>,
    },

    #[error("invalid response format for status {status_code} of operation {operation}: {message}")]
    InvalidResponseFormat {
        operation: String,
        status_code: u16,
        message: String,
        actual: Value,
    },

    #[error("{message}")]
    UnexpectedCallFailure {
        message: String,
        status_code: Option<u16>,
        body: Option<Value>,
        #[source]
        source: Option<BoxError>,
    },
}

impl ClientError {
    pub fn wrong_option(option: impl Into<String>, message: impl Into<String>) -> Self {
        ClientError::WrongOptionType {
            option: option.into(),
            message: message.into(),
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        ClientError::UnexpectedCallFailure {
            message: message.into(),
            status_code: None,
            body: None,
            source: None,
        }
    }

    pub fn unexpected_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        ClientError::UnexpectedCallFailure {
            message: message.into(),
            status_code: None,
            body: None,
            source: Some(source.into()),
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ClientError::OptionsUrlRequired => "OPTIONS_URL_REQUIRED",
            ClientError::WrongOptionType { .. } => "WRONG_OPTION_TYPE",
            ClientError::MissingParamsRequired { .. } => "MISSING_PARAMS_REQUIRED",
            ClientError::FormDataRequired { .. } => "FORM_DATA_REQUIRED",
            ClientError::InvalidResponseSchema { .. } => "INVALID_RESPONSE_SCHEMA",
            ClientError::InvalidContentType { .. } => "INVALID_CONTENT_TYPE",
            ClientError::InvalidResponseFormat { .. } => "INVALID_RESPONSE_FORMAT",
            ClientError::UnexpectedCallFailure { .. } => "UNEXPECTED_CALL_FAILURE",
        }
    }

    /// HTTP status of the response the error was raised for, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::InvalidResponseSchema { status_code, .. }
            | ClientError::InvalidContentType { status_code, .. }
            | ClientError::InvalidResponseFormat { status_code, .. } => Some(*status_code),
            ClientError::UnexpectedCallFailure { status_code, .. } => *status_code,
            _ => None,
        }
    }

    /// Raised before any request left the client
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            ClientError::OptionsUrlRequired
                | ClientError::WrongOptionType { .. }
                | ClientError::MissingParamsRequired { .. }
                | ClientError::FormDataRequired { .. }
        )
    }

    /// Serializable view with the context fields of the failure
    pub fn report(&self) -> ErrorReport {
        let mut context = BTreeMap::new();
        let mut put = |key: &str, value: Value| {
            context.insert(key.to_string(), value);
        };
        match self {
            ClientError::OptionsUrlRequired => {}
            ClientError::WrongOptionType { option, .. } => put("option", option.as_str().into()),
            ClientError::MissingParamsRequired { operation, param } => {
                put("operation", operation.as_str().into());
                put("param", param.as_str().into());
            }
            ClientError::FormDataRequired { operation }
            | ClientError::InvalidResponseSchema { operation, .. } => {
                put("operation", operation.as_str().into())
            }
            ClientError::InvalidContentType {
                operation,
                content_type,
                expected,
                ..
            } => {
                put("operation", operation.as_str().into());
                put("contentType", content_type.as_str().into());
                put("expectedContentTypes", expected.clone().into());
            }
            ClientError::InvalidResponseFormat {
                operation, actual, ..
            } => {
                put("operation", operation.as_str().into());
                put("actualData", actual.clone());
            }
            ClientError::UnexpectedCallFailure { body, source, .. } => {
                if let Some(body) = body {
                    put("body", body.clone());
                }
                if let Some(source) = source {
                    put("cause", source.to_string().into());
                }
            }
        }

        ErrorReport {
            code: self.code(),
            status_code: self.status_code(),
            message: self.to_string(),
            context,
        }
    }
}

impl From<TransportError> for ClientError {
    fn from(error: TransportError) -> Self {
        ClientError::UnexpectedCallFailure {
            message: format!("request failed: {}", error),
            status_code: None,
            body: None,
            source: Some(Box::new(error)),
        }
    }
}

/// Serialized form of a [`ClientError`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub message: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, Value>,
}

/// Failures of a single HTTP exchange
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("no response headers within {0:?}")]
    HeadersTimeout(Duration),

    #[error("response body not received within {0:?}")]
    BodyTimeout(Duration),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}
