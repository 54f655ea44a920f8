//! Query string serialization

use serde_json::{Map, Value};
use url::form_urlencoded;

/// Turns bound query parameters into a query string (without the leading `?`)
pub trait QuerySerializer: Send + Sync {
    fn serialize(&self, params: &[(String, Value)]) -> String;
}

/// Default encoding
///
/// Arrays repeat the key (`tags=a&tags=b`), objects nest as `key[sub]=v`,
/// and `null` values are left out.
#[derive(Debug, Default, Clone, Copy)]
pub struct RepeatedKeySerializer;

impl QuerySerializer for RepeatedKeySerializer {
    fn serialize(&self, params: &[(String, Value)]) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in params {
            append(&mut serializer, key, value);
        }
        serializer.finish()
    }
}

/// `application/x-www-form-urlencoded` body, keyed the same way as queries
pub(crate) fn encode_form(fields: &Map<String, Value>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in fields {
        append(&mut serializer, key, value);
    }
    serializer.finish()
}

fn append(serializer: &mut form_urlencoded::Serializer<'_, String>, key: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                append(serializer, key, item);
            }
        }
        Value::Object(fields) => {
            for (sub, item) in fields {
                append(serializer, &format!("{}[{}]", key, sub), item);
            }
        }
        Value::String(s) => {
            serializer.append_pair(key, s);
        }
        scalar => {
            serializer.append_pair(key, &scalar.to_string());
        }
    }
}

/// Render a scalar argument the way it appears in a path, query or header
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn serialize(params: Vec<(&str, Value)>) -> String {
        let params: Vec<(String, Value)> = params
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        RepeatedKeySerializer.serialize(&params)
    }

    #[test]
    fn test_arrays_repeat_the_key() {
        assert_eq!(
            serialize(vec![("tags", json!(["a", "b"])), ("limit", json!(10))]),
            "tags=a&tags=b&limit=10"
        );
    }

    #[test]
    fn test_objects_and_nulls() {
        assert_eq!(
            serialize(vec![("filter", json!({"year": 1999})), ("skip", Value::Null)]),
            "filter%5Byear%5D=1999"
        );
    }

    #[test]
    fn test_values_are_encoded() {
        assert_eq!(serialize(vec![("q", json!("a b&c"))]), "q=a+b%26c");
        assert_eq!(serialize(vec![("flag", json!(true))]), "flag=true");
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(scalar_text(&json!("x")), "x");
        assert_eq!(scalar_text(&json!(1.5)), "1.5");
        assert_eq!(scalar_text(&json!(false)), "false");
    }
}
