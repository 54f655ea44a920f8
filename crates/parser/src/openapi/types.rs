//! OpenAPI 3.x and Swagger 2.0 type definitions
//!
//! One set of structs covers both major versions; fields that only exist in
//! Swagger 2.0 are grouped at the end of each struct. Everything the
//! normalizer does not consume is ignored during deserialization.

use clientgen_common::SchemaError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Major version of the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecVersion {
    Swagger2,
    OpenApi3,
}

/// OpenAPI document root
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenApiSpec {
    /// OpenAPI version (e.g., "3.0.3")
    #[serde(default)]
    pub openapi: Option<String>,

    /// Swagger version ("2.0")
    #[serde(default)]
    pub swagger: Option<String>,

    /// API metadata
    #[serde(default)]
    pub info: Info,

    /// API paths (endpoints), sorted
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,

    /// Reusable components
    #[serde(default)]
    pub components: Option<Components>,

    /// Servers
    #[serde(default)]
    pub servers: Vec<Server>,

    // Swagger 2.0
    #[serde(default)]
    pub definitions: BTreeMap<String, Schema>,

    #[serde(default)]
    pub parameters: BTreeMap<String, Parameter>,

    #[serde(default)]
    pub responses: BTreeMap<String, Response>,

    #[serde(default)]
    pub host: Option<String>,

    #[serde(rename = "basePath")]
    #[serde(default)]
    pub base_path: Option<String>,

    #[serde(default)]
    pub schemes: Vec<String>,

    #[serde(default)]
    pub consumes: Vec<String>,

    #[serde(default)]
    pub produces: Vec<String>,
}

/// API information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// Server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub url: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// Operations available on one path
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(default)]
    pub get: Option<Operation>,

    #[serde(default)]
    pub post: Option<Operation>,

    #[serde(default)]
    pub put: Option<Operation>,

    #[serde(default)]
    pub patch: Option<Operation>,

    #[serde(default)]
    pub delete: Option<Operation>,

    #[serde(default)]
    pub head: Option<Operation>,

    #[serde(default)]
    pub options: Option<Operation>,

    /// Parameters shared by every operation of the path
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

/// HTTP operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "operationId")]
    #[serde(default)]
    pub operation_id: Option<String>,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub parameters: Vec<Parameter>,

    #[serde(rename = "requestBody")]
    #[serde(default)]
    pub request_body: Option<RequestBody>,

    /// Responses keyed by status code, `NXX` range or `default`
    #[serde(default)]
    pub responses: BTreeMap<String, Response>,

    #[serde(default)]
    pub tags: Vec<String>,

    // Swagger 2.0
    #[serde(default)]
    pub consumes: Vec<String>,

    #[serde(default)]
    pub produces: Vec<String>,
}

/// Parameter definition, or a reference to one
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "$ref")]
    #[serde(default)]
    pub ref_path: Option<String>,

    #[serde(default)]
    pub name: String,

    /// Location: query, header, path, cookie (and body, formData in Swagger 2.0)
    #[serde(rename = "in")]
    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub schema: Option<Schema>,

    // Swagger 2.0 non-body parameters describe their type inline
    #[serde(rename = "type")]
    #[serde(default)]
    pub param_type: Option<String>,

    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub items: Option<Box<Schema>>,

    #[serde(rename = "enum")]
    #[serde(default)]
    pub enum_values: Vec<serde_json::Value>,
}

impl Parameter {
    /// Schema describing the value, from `schema` or the inline Swagger 2.0 fields
    pub fn value_schema(&self) -> Schema {
        if let Some(schema) = &self.schema {
            return schema.clone();
        }
        Schema {
            schema_type: self.param_type.clone().map(SchemaType::Single),
            format: self.format.clone(),
            items: self.items.clone(),
            enum_values: self.enum_values.clone(),
            description: self.description.clone(),
            ..Schema::default()
        }
    }
}

/// Request body, or a reference to one
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(rename = "$ref")]
    #[serde(default)]
    pub ref_path: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Content types
    #[serde(default)]
    pub content: BTreeMap<String, MediaType>,

    #[serde(default)]
    pub required: bool,
}

/// Response, or a reference to one
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "$ref")]
    #[serde(default)]
    pub ref_path: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Content types
    #[serde(default)]
    pub content: BTreeMap<String, MediaType>,

    // Swagger 2.0
    #[serde(default)]
    pub schema: Option<Schema>,
}

/// Media type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(default)]
    pub schema: Option<Schema>,
}

/// `type` may be a single name or, in OpenAPI 3.1, a list of names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    Multiple(Vec<String>),
}

impl SchemaType {
    pub fn names(&self) -> Vec<&str> {
        match self {
            SchemaType::Single(name) => vec![name.as_str()],
            SchemaType::Multiple(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// `additionalProperties` is either a flag or a schema
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<Schema>),
}

/// Schema definition, or a reference to one
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "$ref")]
    #[serde(default)]
    pub ref_path: Option<String>,

    /// Type: string, number, integer, boolean, array, object, null
    #[serde(rename = "type")]
    #[serde(default)]
    pub schema_type: Option<SchemaType>,

    /// Format (e.g., int32, date-time, binary)
    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Object properties, sorted by name
    #[serde(default)]
    pub properties: BTreeMap<String, Schema>,

    /// Required property names
    #[serde(default)]
    pub required: Vec<String>,

    /// Array items
    #[serde(default)]
    pub items: Option<Box<Schema>>,

    #[serde(rename = "additionalProperties")]
    #[serde(default)]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(rename = "enum")]
    #[serde(default)]
    pub enum_values: Vec<serde_json::Value>,

    #[serde(rename = "const")]
    #[serde(default)]
    pub const_value: Option<serde_json::Value>,

    #[serde(rename = "oneOf")]
    #[serde(default)]
    pub one_of: Vec<Schema>,

    #[serde(rename = "anyOf")]
    #[serde(default)]
    pub any_of: Vec<Schema>,

    #[serde(rename = "allOf")]
    #[serde(default)]
    pub all_of: Vec<Schema>,

    #[serde(default)]
    pub nullable: bool,

    #[serde(rename = "x-nullable")]
    #[serde(default)]
    pub x_nullable: bool,
}

/// Reusable components (OpenAPI 3.x)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: BTreeMap<String, Schema>,

    #[serde(default)]
    pub parameters: BTreeMap<String, Parameter>,

    #[serde(rename = "requestBodies")]
    #[serde(default)]
    pub request_bodies: BTreeMap<String, RequestBody>,

    #[serde(default)]
    pub responses: BTreeMap<String, Response>,
}

/// Name addressed by a local reference, if it starts with one of `prefixes`
///
/// JSON pointer escapes (`~1`, `~0`) are decoded.
pub fn ref_name(ref_path: &str, prefixes: &[&str]) -> Option<String> {
    prefixes
        .iter()
        .find_map(|prefix| ref_path.strip_prefix(prefix))
        .filter(|name| !name.is_empty() && !name.contains('/'))
        .map(|name| name.replace("~1", "/").replace("~0", "~"))
}

pub const SCHEMA_REF_PREFIXES: &[&str] = &["#/components/schemas/", "#/definitions/"];
const PARAMETER_REF_PREFIXES: &[&str] = &["#/components/parameters/", "#/parameters/"];
const REQUEST_BODY_REF_PREFIXES: &[&str] = &["#/components/requestBodies/"];
const RESPONSE_REF_PREFIXES: &[&str] = &["#/components/responses/", "#/responses/"];

impl OpenApiSpec {
    /// Detect the major version, rejecting anything other than 2.x and 3.x
    pub fn version(&self) -> Result<SpecVersion, SchemaError> {
        match (&self.openapi, &self.swagger) {
            (Some(v), _) if v.starts_with("3.") => Ok(SpecVersion::OpenApi3),
            (Some(v), _) => Err(SchemaError::UnsupportedVersion(v.clone())),
            (None, Some(v)) if v.starts_with("2.") => Ok(SpecVersion::Swagger2),
            (None, Some(v)) => Err(SchemaError::UnsupportedVersion(v.clone())),
            (None, None) => Err(SchemaError::ParseFailure(
                "document declares neither `openapi` nor `swagger`".to_string(),
            )),
        }
    }

    /// Named schemas from `components.schemas` (3.x) or `definitions` (2.0)
    pub fn schemas(&self) -> &BTreeMap<String, Schema> {
        match &self.components {
            Some(components) if !components.schemas.is_empty() => &components.schemas,
            _ => &self.definitions,
        }
    }

    /// Follow a parameter `$ref`
    pub fn resolve_parameter<'a>(
        &'a self,
        parameter: &'a Parameter,
    ) -> Result<&'a Parameter, SchemaError> {
        let Some(ref_path) = &parameter.ref_path else {
            return Ok(parameter);
        };
        ref_name(ref_path, PARAMETER_REF_PREFIXES)
            .and_then(|name| {
                self.components
                    .as_ref()
                    .and_then(|c| c.parameters.get(&name))
                    .or_else(|| self.parameters.get(&name))
            })
            .ok_or_else(|| SchemaError::UnresolvedReference(ref_path.clone()))
    }

    /// Follow a request body `$ref`
    pub fn resolve_request_body<'a>(
        &'a self,
        body: &'a RequestBody,
    ) -> Result<&'a RequestBody, SchemaError> {
        let Some(ref_path) = &body.ref_path else {
            return Ok(body);
        };
        ref_name(ref_path, REQUEST_BODY_REF_PREFIXES)
            .and_then(|name| {
                self.components
                    .as_ref()
                    .and_then(|c| c.request_bodies.get(&name))
            })
            .ok_or_else(|| SchemaError::UnresolvedReference(ref_path.clone()))
    }

    /// Follow a response `$ref`
    pub fn resolve_response<'a>(
        &'a self,
        response: &'a Response,
    ) -> Result<&'a Response, SchemaError> {
        let Some(ref_path) = &response.ref_path else {
            return Ok(response);
        };
        ref_name(ref_path, RESPONSE_REF_PREFIXES)
            .and_then(|name| {
                self.components
                    .as_ref()
                    .and_then(|c| c.responses.get(&name))
                    .or_else(|| self.responses.get(&name))
            })
            .ok_or_else(|| SchemaError::UnresolvedReference(ref_path.clone()))
    }
}

impl PathItem {
    /// Operation declared for a method, if any
    pub fn operation(&self, method: clientgen_common::HttpMethod) -> Option<&Operation> {
        use clientgen_common::HttpMethod;
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
        }
    }
}
