//! Raw schema loading and kind detection

use clientgen_common::{SchemaError, SchemaKind};
use serde_json::Value;

/// Parse schema text as JSON, falling back to YAML
pub fn parse_document(text: &str) -> Result<Value, SchemaError> {
    match serde_json::from_str::<Value>(text) {
        Ok(document) => Ok(document),
        Err(json_err) => serde_yaml::from_str::<Value>(text).map_err(|yaml_err| {
            SchemaError::ParseFailure(format!(
                "not valid JSON ({}) or YAML ({})",
                json_err, yaml_err
            ))
        }),
    }
}

/// Decide whether a document is an OpenAPI description or a GraphQL
/// introspection result
pub fn detect_kind(document: &Value) -> Result<SchemaKind, SchemaError> {
    let Some(object) = document.as_object() else {
        return Err(SchemaError::ParseFailure(
            "schema document must be an object".to_string(),
        ));
    };

    if object.contains_key("openapi") || object.contains_key("swagger") {
        return Ok(SchemaKind::OpenApi);
    }
    let nested = object
        .get("data")
        .and_then(Value::as_object)
        .is_some_and(|data| data.contains_key("__schema"));
    if object.contains_key("__schema") || nested {
        return Ok(SchemaKind::Graphql);
    }
    Err(SchemaError::AmbiguousKind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_is_preferred() {
        let document = parse_document(r#"{"openapi": "3.1.0"}"#).unwrap();
        assert_eq!(document, json!({"openapi": "3.1.0"}));
    }

    #[test]
    fn test_yaml_fallback() {
        let document = parse_document("swagger: '2.0'\npaths: {}\n").unwrap();
        assert_eq!(document["swagger"], "2.0");
    }

    #[test]
    fn test_garbage_is_parse_failure() {
        let result = parse_document("{ not: [valid");
        assert!(matches!(result, Err(SchemaError::ParseFailure(_))));
    }

    #[test]
    fn test_detect_kind() {
        assert_eq!(
            detect_kind(&json!({"openapi": "3.0.0"})),
            Ok(SchemaKind::OpenApi)
        );
        assert_eq!(
            detect_kind(&json!({"swagger": "2.0"})),
            Ok(SchemaKind::OpenApi)
        );
        assert_eq!(
            detect_kind(&json!({"__schema": {}})),
            Ok(SchemaKind::Graphql)
        );
        assert_eq!(
            detect_kind(&json!({"data": {"__schema": {}}})),
            Ok(SchemaKind::Graphql)
        );
        assert_eq!(
            detect_kind(&json!({"info": {}})),
            Err(SchemaError::AmbiguousKind)
        );
        assert!(matches!(
            detect_kind(&json!("hello")),
            Err(SchemaError::ParseFailure(_))
        ));
    }
}
