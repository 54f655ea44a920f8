//! Template loading and management

use clientgen_common::naming::quote;
use clientgen_common::{GeneratorError, Result};
use std::collections::HashMap;
use tera::{Tera, Value};

/// Load all templates
pub fn load_templates() -> Result<Tera> {
    let mut tera = Tera::default();

    tera.register_filter("ann", annotation_filter);
    tera.register_filter("js_string", js_string_filter);

    let templates = [
        ("declarations", include_str!("../templates/declarations.ts.tera")),
        ("frontend", include_str!("../templates/frontend.tera")),
        ("plugin", include_str!("../templates/plugin.tera")),
    ];
    for (name, source) in templates {
        tera.add_raw_template(name, source).map_err(|e| {
            GeneratorError::Generation(format!("Failed to load {} template: {}", name, e))
        })?;
    }

    Ok(tera)
}

/// `{{ "string" | ann(on=typescript) }}` renders `: string` in TypeScript
/// output and nothing in JavaScript
fn annotation_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let ty = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("ann filter expects a string"))?;
    let on = args.get("on").and_then(Value::as_bool).unwrap_or(false);

    Ok(Value::String(if on {
        format!(": {}", ty)
    } else {
        String::new()
    }))
}

/// Quote a value as a JavaScript string literal
fn js_string_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("js_string filter expects a string"))?;
    Ok(Value::String(quote(s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_load() {
        let tera = load_templates().unwrap();
        let names: Vec<&str> = tera.get_template_names().collect();
        assert!(names.contains(&"declarations"));
        assert!(names.contains(&"frontend"));
        assert!(names.contains(&"plugin"));
    }

    #[test]
    fn test_annotation_filter() {
        let mut args = HashMap::new();
        args.insert("on".to_string(), Value::Bool(true));
        let typed = annotation_filter(&Value::String("string".into()), &args).unwrap();
        assert_eq!(typed, Value::String(": string".into()));

        args.insert("on".to_string(), Value::Bool(false));
        let untyped = annotation_filter(&Value::String("string".into()), &args).unwrap();
        assert_eq!(untyped, Value::String(String::new()));
    }

    #[test]
    fn test_js_string_filter() {
        let quoted = js_string_filter(&Value::String("a\"b".into()), &HashMap::new()).unwrap();
        assert_eq!(quoted, Value::String(r#""a\"b""#.into()));
    }
}
