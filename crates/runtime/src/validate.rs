//! Response validation against the operation's declared responses

use crate::bind::kind_name;
use crate::error::{ClientError, Result};
use crate::transport::HttpResponse;
use clientgen_common::{is_json_media_type, Operation, Primitive, TypeGraph, TypeId, TypeKind};
use serde_json::Value;

/// Nesting beyond which values are accepted unchecked
const MAX_DEPTH: usize = 128;

/// Validate a response and decode its body
///
/// The response entry is picked by exact status, then `NXX` range, then
/// `default`. Fields the schema does not declare are tolerated.
pub fn validate_response(op: &Operation, graph: &TypeGraph, response: &HttpResponse) -> Result<Value> {
    let status_code = response.status;
    let spec = op
        .response_for(status_code)
        .ok_or_else(|| ClientError::InvalidResponseSchema {
            operation: op.id.clone(),
            status_code,
        })?;

    if spec.content.is_empty() {
        return Ok(decode_body(response));
    }

    let content_type = response.content_type().unwrap_or_default();
    let media = spec
        .content
        .iter()
        .find(|m| m.accepts(content_type))
        .ok_or_else(|| ClientError::InvalidContentType {
            operation: op.id.clone(),
            status_code,
            content_type: content_type.to_string(),
            expected: spec.content.iter().map(|m| m.media_type.clone()).collect(),
        })?;

    if !is_json_media_type(content_type) {
        return Ok(decode_body(response));
    }

    let invalid = |message: String, actual: Value| ClientError::InvalidResponseFormat {
        operation: op.id.clone(),
        status_code,
        message,
        actual,
    };
    let body: Value = serde_json::from_slice(&response.body).map_err(|e| {
        invalid(
            format!("body is not valid JSON: {}", e),
            Value::String(String::from_utf8_lossy(&response.body).into_owned()),
        )
    })?;
    if let Some(ty) = media.ty {
        check(graph, ty, &body).map_err(|message| invalid(message, body.clone()))?;
    }
    Ok(body)
}

/// Decode a body without validating it
///
/// JSON content types are parsed when possible; anything else, or JSON
/// that fails to parse, comes back as a string. An empty body is `null`.
pub fn decode_body(response: &HttpResponse) -> Value {
    if response.body.is_empty() {
        return Value::Null;
    }
    if response.content_type().is_some_and(is_json_media_type) {
        if let Ok(value) = serde_json::from_slice(&response.body) {
            return value;
        }
    }
    Value::String(String::from_utf8_lossy(&response.body).into_owned())
}

/// Structurally check a value against a type, naming the first mismatch
pub fn check(graph: &TypeGraph, ty: TypeId, value: &Value) -> std::result::Result<(), String> {
    let mut path = String::from("$");
    check_at(graph, ty, value, &mut path, 0)
}

fn check_at(
    graph: &TypeGraph,
    ty: TypeId,
    value: &Value,
    path: &mut String,
    depth: usize,
) -> std::result::Result<(), String> {
    if depth > MAX_DEPTH {
        return Ok(());
    }
    let mismatch = |path: &str| {
        Err(format!(
            "{}: expected {}, got {}",
            path,
            graph.describe(ty),
            kind_name(value)
        ))
    };

    match graph.kind(ty) {
        TypeKind::Unknown => Ok(()),
        TypeKind::Primitive(primitive) => {
            let ok = match primitive {
                Primitive::String => value.is_string(),
                Primitive::Number => value.is_number(),
                Primitive::Boolean => value.is_boolean(),
                Primitive::Null => value.is_null(),
            };
            if ok {
                Ok(())
            } else {
                mismatch(path)
            }
        }
        TypeKind::Enum(values) => {
            if values.contains(value) {
                Ok(())
            } else {
                Err(format!("{}: {} is not one of {}", path, value, graph.describe(ty)))
            }
        }
        TypeKind::Array(item) => {
            let Some(items) = value.as_array() else {
                return mismatch(path);
            };
            for (index, element) in items.iter().enumerate() {
                let len = path.len();
                path.push_str(&format!("[{}]", index));
                check_at(graph, *item, element, path, depth + 1)?;
                path.truncate(len);
            }
            Ok(())
        }
        TypeKind::Map(entry) => {
            let Some(map) = value.as_object() else {
                return mismatch(path);
            };
            for (key, element) in map {
                let len = path.len();
                path.push_str(&format!(".{}", key));
                check_at(graph, *entry, element, path, depth + 1)?;
                path.truncate(len);
            }
            Ok(())
        }
        TypeKind::Object(fields) => {
            let Some(map) = value.as_object() else {
                return mismatch(path);
            };
            for field in fields {
                match map.get(&field.name) {
                    Some(element) => {
                        let len = path.len();
                        path.push_str(&format!(".{}", field.name));
                        check_at(graph, field.ty, element, path, depth + 1)?;
                        path.truncate(len);
                    }
                    None if field.required => {
                        return Err(format!("{}: missing required field `{}`", path, field.name))
                    }
                    None => {}
                }
            }
            Ok(())
        }
        TypeKind::Union(members) => {
            let mut first_error = None;
            for member in members {
                let mut member_path = path.clone();
                match check_at(graph, *member, value, &mut member_path, depth + 1) {
                    Ok(()) => return Ok(()),
                    Err(error) => {
                        first_error.get_or_insert(error);
                    }
                }
            }
            match (members.len(), first_error) {
                (1, Some(error)) => Err(error),
                _ => mismatch(path),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::HeaderSet;
    use clientgen_common::{Field, HttpMethod, MediaSpec, ResponseSpec, StatusKey};
    use serde_json::json;

    fn movie_graph() -> (TypeGraph, TypeId) {
        let mut graph = TypeGraph::new();
        let number = graph.primitive(Primitive::Number);
        let string = graph.primitive(Primitive::String);
        let movie = graph.reserve_named("Movie");
        let sequel = graph.add(TypeKind::Union(vec![movie]));
        graph.set_kind(
            movie,
            TypeKind::Object(vec![
                Field::new("id", number, true),
                Field::new("title", string, true),
                Field::new("sequel", sequel, false),
            ]),
        );
        let movies = graph.add(TypeKind::Array(movie));
        (graph, movies)
    }

    fn get_movies(ty: TypeId) -> Operation {
        Operation {
            id: "getMovies".to_string(),
            operation_id: Some("getMovies".to_string()),
            method: HttpMethod::Get,
            path: "/movies".to_string(),
            summary: None,
            parameters: vec![],
            content_type: None,
            responses: vec![
                ResponseSpec {
                    status: StatusKey::Code(200),
                    description: None,
                    content: vec![MediaSpec {
                        media_type: "application/json".to_string(),
                        ty: Some(ty),
                    }],
                },
                ResponseSpec {
                    status: StatusKey::Range(5),
                    description: None,
                    content: vec![MediaSpec {
                        media_type: "text/*".to_string(),
                        ty: None,
                    }],
                },
            ],
        }
    }

    fn response(status: u16, content_type: &str, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HeaderSet::new().with("content-type", content_type),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_valid_body_with_extra_fields() {
        let (graph, movies) = movie_graph();
        let op = get_movies(movies);
        let body = r#"[{"id": 1, "title": "X", "rating": 5, "sequel": {"id": 2, "title": "Y"}}]"#;
        let value = validate_response(&op, &graph, &response(200, "application/json; charset=utf-8", body)).unwrap();
        assert_eq!(value[0]["sequel"]["title"], "Y");
    }

    #[test]
    fn test_wrong_primitive_kind() {
        let (graph, movies) = movie_graph();
        let op = get_movies(movies);
        let error = validate_response(&op, &graph, &response(200, "application/json", r#"[{"id": "1"}]"#)).unwrap_err();
        match error {
            ClientError::InvalidResponseFormat { message, actual, .. } => {
                assert_eq!(message, "$[0].id: expected number, got string");
                assert_eq!(actual, json!([{"id": "1"}]));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_nested_missing_field() {
        let (graph, movies) = movie_graph();
        let op = get_movies(movies);
        let body = r#"[{"id": 1, "title": "X", "sequel": {"id": 2}}]"#;
        let error = validate_response(&op, &graph, &response(200, "application/json", body)).unwrap_err();
        assert!(error.to_string().contains("$[0].sequel: missing required field `title`"));
    }

    #[test]
    fn test_status_without_schema() {
        let (graph, movies) = movie_graph();
        let op = get_movies(movies);
        let error = validate_response(&op, &graph, &response(404, "application/json", "{}")).unwrap_err();
        assert!(matches!(error, ClientError::InvalidResponseSchema { status_code: 404, .. }));
    }

    #[test]
    fn test_content_type_mismatch_and_ranges() {
        let (graph, movies) = movie_graph();
        let op = get_movies(movies);
        let error = validate_response(&op, &graph, &response(200, "text/html", "<p>")).unwrap_err();
        assert!(matches!(error, ClientError::InvalidContentType { ref content_type, .. } if content_type == "text/html"));

        let value = validate_response(&op, &graph, &response(503, "text/plain", "down")).unwrap();
        assert_eq!(value, json!("down"));
    }

    #[test]
    fn test_malformed_json() {
        let (graph, movies) = movie_graph();
        let op = get_movies(movies);
        let error = validate_response(&op, &graph, &response(200, "application/json", "[{")).unwrap_err();
        assert_eq!(error.code(), "INVALID_RESPONSE_FORMAT");
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(&response(200, "application/json", r#"{"a":1}"#)), json!({"a": 1}));
        assert_eq!(decode_body(&response(200, "application/json", "oops")), json!("oops"));
        assert_eq!(decode_body(&response(204, "text/plain", "")), Value::Null);
    }

    #[test]
    fn test_unions_and_enums() {
        let mut graph = TypeGraph::new();
        let number = graph.primitive(Primitive::Number);
        let null = graph.primitive(Primitive::Null);
        let rating = graph.add(TypeKind::Union(vec![number, null]));
        let genre = graph.add(TypeKind::Enum(vec![json!("drama"), json!("comedy")]));

        assert!(check(&graph, rating, &json!(4.5)).is_ok());
        assert!(check(&graph, rating, &Value::Null).is_ok());
        assert_eq!(
            check(&graph, rating, &json!("x")).unwrap_err(),
            "$: expected number | null, got string"
        );
        assert!(check(&graph, genre, &json!("drama")).is_ok());
        assert!(check(&graph, genre, &json!("horror")).is_err());
    }
}
