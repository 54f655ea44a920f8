//! Operation IR produced by the schema normalizers

use crate::types::{TypeGraph, TypeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Which family of schema a definition was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    OpenApi,
    Graphql,
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaKind::OpenApi => write!(f, "openapi"),
            SchemaKind::Graphql => write!(f, "graphql"),
        }
    }
}

/// HTTP methods that can carry an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    /// All methods, in the order path items are walked
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a parameter value travels in the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Body,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    pub ty: TypeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Coarse classification of a request body media type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentKind {
    Json,
    Multipart,
    FormUrlEncoded,
    Other,
}

impl ContentKind {
    pub fn classify(media_type: &str) -> Self {
        if is_json_media_type(media_type) {
            ContentKind::Json
        } else if media_type.eq_ignore_ascii_case("multipart/form-data") {
            ContentKind::Multipart
        } else if media_type
            .split(';')
            .next()
            .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/x-www-form-urlencoded"))
        {
            ContentKind::FormUrlEncoded
        } else {
            ContentKind::Other
        }
    }
}

/// `application/json` and structured-syntax `+json` types
pub fn is_json_media_type(media_type: &str) -> bool {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestContent {
    pub kind: ContentKind,
    pub media_type: String,
}

/// Response key of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKey {
    Code(u16),
    /// `2XX`-style range, holding the leading digit
    Range(u8),
    Default,
}

impl StatusKey {
    pub fn parse(key: &str) -> Option<Self> {
        if key.eq_ignore_ascii_case("default") {
            return Some(StatusKey::Default);
        }
        if key.len() == 3 && key.is_ascii() && key[1..].eq_ignore_ascii_case("xx") {
            return key[..1]
                .parse::<u8>()
                .ok()
                .filter(|d| (1..=5).contains(d))
                .map(StatusKey::Range);
        }
        key.parse::<u16>().ok().map(StatusKey::Code)
    }

    pub fn label(&self) -> String {
        match self {
            StatusKey::Code(code) => code.to_string(),
            StatusKey::Range(digit) => format!("{}XX", digit),
            StatusKey::Default => "Default".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSpec {
    pub media_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<TypeId>,
}

impl MediaSpec {
    pub fn is_json(&self) -> bool {
        is_json_media_type(&self.media_type)
    }

    /// Whether a response content type satisfies this entry, honoring `*/*` and `type/*`
    pub fn accepts(&self, content_type: &str) -> bool {
        let declared = self.media_type.to_ascii_lowercase();
        let actual = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if declared == "*/*" || declared == actual {
            return true;
        }
        match declared.strip_suffix("/*") {
            Some(prefix) => actual
                .split_once('/')
                .map(|(major, _)| major == prefix)
                .unwrap_or(false),
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSpec {
    pub status: StatusKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub content: Vec<MediaSpec>,
}

/// A single callable unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Resolved unique identifier
    pub id: String,
    /// Identifier declared by the schema, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    pub method: HttpMethod,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<RequestContent>,
    pub responses: Vec<ResponseSpec>,
}

impl Operation {
    pub fn params_in(&self, location: ParamLocation) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .iter()
            .filter(move |p| p.location == location)
    }

    pub fn body(&self) -> Option<&Parameter> {
        self.params_in(ParamLocation::Body).next()
    }

    pub fn is_multipart(&self) -> bool {
        matches!(
            self.content_type,
            Some(RequestContent {
                kind: ContentKind::Multipart,
                ..
            })
        )
    }

    /// Response entry for a status: exact code, then range, then `default`
    pub fn response_for(&self, status: u16) -> Option<&ResponseSpec> {
        let exact = self
            .responses
            .iter()
            .find(|r| r.status == StatusKey::Code(status));
        let range = || {
            self.responses
                .iter()
                .find(|r| r.status == StatusKey::Range((status / 100) as u8))
        };
        let default = || {
            self.responses
                .iter()
                .find(|r| r.status == StatusKey::Default)
        };
        exact.or_else(range).or_else(default)
    }
}

/// Root operation type names of a GraphQL schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphqlRoots {
    pub query: Option<String>,
    pub mutation: Option<String>,
    pub subscription: Option<String>,
}

/// Path and method of an operation, as exposed by route introspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub path: String,
    pub method: HttpMethod,
}

/// Normalized schema: every operation plus the type graph they reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiDefinition {
    pub kind: SchemaKind,
    pub title: String,
    pub version: String,
    pub servers: Vec<String>,
    pub operations: Vec<Operation>,
    pub types: TypeGraph,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graphql: Option<GraphqlRoots>,
}

impl ApiDefinition {
    pub fn operation(&self, id: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.id == id)
    }

    /// Operation id to route mapping
    pub fn routes(&self) -> BTreeMap<String, Route> {
        self.operations
            .iter()
            .map(|op| {
                (
                    op.id.clone(),
                    Route {
                        path: op.path.clone(),
                        method: op.method,
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operation(responses: Vec<ResponseSpec>) -> Operation {
        Operation {
            id: "getMovies".into(),
            operation_id: None,
            method: HttpMethod::Get,
            path: "/movies".into(),
            summary: None,
            parameters: vec![],
            content_type: None,
            responses,
        }
    }

    fn response(status: StatusKey) -> ResponseSpec {
        ResponseSpec {
            status,
            description: None,
            content: vec![],
        }
    }

    #[test]
    fn test_status_key_parse() {
        assert_eq!(StatusKey::parse("200"), Some(StatusKey::Code(200)));
        assert_eq!(StatusKey::parse("4XX"), Some(StatusKey::Range(4)));
        assert_eq!(StatusKey::parse("5xx"), Some(StatusKey::Range(5)));
        assert_eq!(StatusKey::parse("default"), Some(StatusKey::Default));
        assert_eq!(StatusKey::parse("9XX"), None);
        assert_eq!(StatusKey::parse("ok"), None);
    }

    #[test]
    fn test_response_for_precedence() {
        let op = operation(vec![
            response(StatusKey::Default),
            response(StatusKey::Range(2)),
            response(StatusKey::Code(201)),
        ]);
        assert_eq!(op.response_for(201).unwrap().status, StatusKey::Code(201));
        assert_eq!(op.response_for(200).unwrap().status, StatusKey::Range(2));
        assert_eq!(op.response_for(404).unwrap().status, StatusKey::Default);

        let strict = operation(vec![response(StatusKey::Code(200))]);
        assert!(strict.response_for(404).is_none());
    }

    #[test]
    fn test_media_accepts() {
        let json = MediaSpec {
            media_type: "application/json".into(),
            ty: None,
        };
        assert!(json.accepts("application/json; charset=utf-8"));
        assert!(!json.accepts("text/html"));

        let any_text = MediaSpec {
            media_type: "text/*".into(),
            ty: None,
        };
        assert!(any_text.accepts("text/plain"));
        assert!(!any_text.accepts("application/xml"));
    }

    #[test]
    fn test_content_kind_classify() {
        assert_eq!(ContentKind::classify("application/json"), ContentKind::Json);
        assert_eq!(
            ContentKind::classify("application/problem+json"),
            ContentKind::Json
        );
        assert_eq!(
            ContentKind::classify("multipart/form-data"),
            ContentKind::Multipart
        );
        assert_eq!(
            ContentKind::classify("application/x-www-form-urlencoded; charset=utf-8"),
            ContentKind::FormUrlEncoded
        );
        assert_eq!(ContentKind::classify("text/plain"), ContentKind::Other);
    }
}
