//! OpenAPI document parser

use super::types::OpenApiSpec;
use crate::document::parse_document;
use clientgen_common::{ApiDefinition, GeneratorError, Result, SchemaError};
use std::fs;
use std::path::Path;

/// OpenAPI specification parser
///
/// Reads OpenAPI 3.x and Swagger 2.0 documents, in JSON or YAML.
#[derive(Debug)]
pub struct OpenApiParser {
    /// Loaded OpenAPI spec
    spec: OpenApiSpec,
}

impl OpenApiParser {
    /// Load an OpenAPI document from a file path
    ///
    /// # Example
    /// ```rust,ignore
    /// let parser = OpenApiParser::from_file("movies.openapi.yaml")?;
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            GeneratorError::Generation(format!(
                "Failed to read OpenAPI file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_text(&content)
    }

    /// Parse an OpenAPI document from JSON or YAML text
    pub fn from_text(text: &str) -> Result<Self> {
        Self::from_value(parse_document(text)?)
    }

    /// Build from an already parsed document.
    ///
    /// The version is checked before the structure, so an OpenAPI 4 document
    /// reports `UnsupportedVersion` rather than a shape error.
    pub fn from_value(mut document: serde_json::Value) -> Result<Self> {
        let header = OpenApiSpec {
            openapi: version_field(&document, "openapi"),
            swagger: version_field(&document, "swagger"),
            ..OpenApiSpec::default()
        };
        header.version()?;

        if let Some(object) = document.as_object_mut() {
            for (key, version) in [("openapi", header.openapi), ("swagger", header.swagger)] {
                if let Some(version) = version {
                    object.insert(key.to_string(), serde_json::Value::String(version));
                }
            }
        }

        let spec: OpenApiSpec = serde_json::from_value(document).map_err(|e| {
            SchemaError::ParseFailure(format!("Invalid OpenAPI document: {}", e))
        })?;
        Ok(Self { spec })
    }

    /// Normalize the document into an [`ApiDefinition`]
    pub fn parse(&self) -> Result<ApiDefinition> {
        super::converter::convert_openapi_to_api_definition(&self.spec)
    }

    /// Get reference to the underlying OpenAPI spec
    pub fn spec(&self) -> &OpenApiSpec {
        &self.spec
    }
}

/// Version markers may be written as numbers in YAML (`swagger: 2.0`)
fn version_field(document: &serde_json::Value, key: &str) -> Option<String> {
    match document.get(key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_openapi() {
        let openapi_json = r#"{
            "openapi": "3.0.0",
            "info": {
                "title": "Test API",
                "version": "1.0.0"
            },
            "paths": {}
        }"#;

        let parser = OpenApiParser::from_text(openapi_json).unwrap();
        assert_eq!(parser.spec().openapi.as_deref(), Some("3.0.0"));
        assert_eq!(parser.spec().info.title, "Test API");
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = "openapi: 3.0.3\ninfo:\n  title: Movies\n  version: '1'\npaths: {}\n";
        let parser = OpenApiParser::from_text(yaml).unwrap();
        assert_eq!(parser.spec().info.title, "Movies");
    }

    #[test]
    fn test_numeric_swagger_version() {
        let yaml = "swagger: 2.0\ninfo:\n  title: Legacy\n  version: '1'\npaths: {}\n";
        let parser = OpenApiParser::from_text(yaml).unwrap();
        assert_eq!(parser.spec().swagger.as_deref(), Some("2.0"));
        assert!(parser.parse().is_ok());
    }

    #[test]
    fn test_unsupported_version() {
        let result = OpenApiParser::from_text(r#"{"openapi": "4.0.0", "paths": []}"#);
        assert!(matches!(
            result,
            Err(GeneratorError::Schema(SchemaError::UnsupportedVersion(v))) if v == "4.0.0"
        ));
    }

    #[test]
    fn test_malformed_shape() {
        let result = OpenApiParser::from_text(r#"{"openapi": "3.0.0", "paths": []}"#);
        assert!(matches!(
            result,
            Err(GeneratorError::Schema(SchemaError::ParseFailure(_)))
        ));
    }
}
