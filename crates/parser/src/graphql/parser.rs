//! GraphQL introspection parser

use super::types::IntrospectionSchema;
use crate::document::parse_document;
use clientgen_common::{ApiDefinition, GeneratorError, Result, SchemaError};
use std::fs;
use std::path::Path;

/// GraphQL introspection result parser
///
/// Accepts either the bare `{"__schema": ...}` object or a full response
/// envelope `{"data": {"__schema": ...}}`.
#[derive(Debug)]
pub struct GraphqlParser {
    schema: IntrospectionSchema,
}

impl GraphqlParser {
    /// Load an introspection result from a file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            GeneratorError::Generation(format!(
                "Failed to read GraphQL introspection file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_text(&content)
    }

    pub fn from_text(text: &str) -> Result<Self> {
        Self::from_value(parse_document(text)?)
    }

    pub fn from_value(mut document: serde_json::Value) -> Result<Self> {
        let raw = match document.get_mut("__schema") {
            Some(schema) => schema.take(),
            None => document
                .get_mut("data")
                .and_then(|data| data.get_mut("__schema"))
                .map(serde_json::Value::take)
                .ok_or_else(|| {
                    SchemaError::ParseFailure(
                        "introspection result has no `__schema` object".to_string(),
                    )
                })?,
        };

        let schema: IntrospectionSchema = serde_json::from_value(raw).map_err(|e| {
            SchemaError::ParseFailure(format!("Invalid GraphQL introspection: {}", e))
        })?;
        Ok(Self { schema })
    }

    /// Normalize the introspection result into an [`ApiDefinition`]
    pub fn parse(&self) -> Result<ApiDefinition> {
        super::converter::convert_graphql_to_api_definition(&self.schema)
    }

    pub fn schema(&self) -> &IntrospectionSchema {
        &self.schema
    }
}
