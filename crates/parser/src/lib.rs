//! Schema normalization for clientgen
//!
//! This crate turns raw API descriptions into the intermediate
//! representation (`ApiDefinition`) consumed by the emitter and the runtime.
//!
//! ## Supported inputs
//! - OpenAPI 3.x and Swagger 2.0, JSON or YAML
//! - GraphQL introspection results (JSON)
//!
//! Text is parsed as JSON first and YAML second. The kind is detected from
//! the top-level keys unless the caller overrides it.

pub mod document;
pub mod graphql;
mod name_resolver;
pub mod openapi;
mod type_mapper;

pub use document::{detect_kind, parse_document};
pub use graphql::GraphqlParser;
pub use name_resolver::{NameCandidate, NameResolver};
pub use openapi::OpenApiParser;
pub use type_mapper::TypeMapper;

use clientgen_common::{ApiDefinition, GeneratorError, Result, SchemaKind};
use std::path::Path;

/// Normalize raw schema text
///
/// # Arguments
/// * `raw` - OpenAPI or GraphQL introspection document, JSON or YAML
/// * `kind` - Skip detection and treat the document as this kind
pub fn normalize(raw: &str, kind: Option<SchemaKind>) -> Result<ApiDefinition> {
    normalize_value(parse_document(raw)?, kind)
}

/// Normalize an already parsed document
pub fn normalize_value(document: serde_json::Value, kind: Option<SchemaKind>) -> Result<ApiDefinition> {
    let kind = match kind {
        Some(kind) => kind,
        None => detect_kind(&document)?,
    };
    tracing::debug!(%kind, "normalizing schema");

    match kind {
        SchemaKind::OpenApi => OpenApiParser::from_value(document)?.parse(),
        SchemaKind::Graphql => GraphqlParser::from_value(document)?.parse(),
    }
}

/// Read and normalize a schema file
pub fn normalize_file<P: AsRef<Path>>(path: P, kind: Option<SchemaKind>) -> Result<ApiDefinition> {
    let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        GeneratorError::Generation(format!(
            "Failed to read schema {}: {}",
            path.as_ref().display(),
            e
        ))
    })?;
    normalize(&raw, kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clientgen_common::SchemaError;

    #[test]
    fn test_ambiguous_without_override() {
        let result = normalize(r#"{"info": {"title": "x"}}"#, None);
        assert!(matches!(
            result,
            Err(GeneratorError::Schema(SchemaError::AmbiguousKind))
        ));
    }

    #[test]
    fn test_override_skips_detection() {
        let raw = r#"{"queryType": {"name": "Query"}, "__schema": {"queryType": {"name": "Query"}, "types": []}}"#;
        let api = normalize(raw, Some(SchemaKind::Graphql)).unwrap();
        assert_eq!(api.kind, SchemaKind::Graphql);
    }
}
