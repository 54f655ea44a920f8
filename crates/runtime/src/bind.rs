//! Binding call arguments onto an operation

use crate::error::{ClientError, Result};
use crate::headers::HeaderSet;
use crate::plugin::RequestContext;
use crate::query::{encode_form, scalar_text};
use crate::transport::{FormData, RequestBody};
use crate::validate::check;
use clientgen_common::{
    ContentKind, Operation, ParamLocation, Parameter, TypeGraph, TypeId, TypeKind,
};
use serde_json::{Map, Value};

/// Arguments of one call
///
/// `values` holds the flat parameter values, or the
/// `{ path, query, headers, body }` envelope when the client runs in
/// full-request mode.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    pub(crate) values: Value,
    pub(crate) form: Option<FormData>,
    pub(crate) headers: HeaderSet,
    pub(crate) incoming: HeaderSet,
    pub(crate) telemetry: HeaderSet,
}

impl CallArgs {
    pub fn new(values: Value) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }

    /// Multipart body for operations that take form data
    pub fn form(mut self, form: FormData) -> Self {
        self.form = Some(form);
        self
    }

    /// Explicit header, overriding every other source
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Make the call on behalf of an inbound request
    pub fn context(mut self, context: &RequestContext) -> Self {
        self.incoming = context.headers().clone();
        self.telemetry = context.telemetry().clone();
        self
    }
}

impl From<Value> for CallArgs {
    fn from(values: Value) -> Self {
        CallArgs::new(values)
    }
}

/// Operation arguments sorted into request parts
#[derive(Debug, Clone, PartialEq)]
pub struct BoundRequest {
    /// Decoded path segments, placeholders substituted
    pub segments: Vec<String>,
    pub query: Vec<(String, Value)>,
    /// Header parameters
    pub headers: HeaderSet,
    pub body: RequestBody,
}

const ENVELOPE_KEYS: [&str; 4] = ["path", "query", "headers", "body"];

/// Bind arguments to an operation, failing before any I/O
///
/// Required values are checked first, in declaration order, then the type
/// of every supplied value.
pub fn bind(
    op: &Operation,
    graph: &TypeGraph,
    args: &CallArgs,
    full_request: bool,
) -> Result<BoundRequest> {
    let empty = Map::new();
    let values = match &args.values {
        Value::Null => &empty,
        Value::Object(values) => values,
        other => {
            return Err(ClientError::wrong_option(
                "args",
                format!("expected an object, got {}", kind_name(other)),
            ))
        }
    };

    let source = if full_request {
        ArgSource::envelope(values, &empty)?
    } else {
        ArgSource::Flat(values)
    };

    let body_param = op.body();
    let multipart = op.is_multipart();
    let body_value = if multipart {
        None
    } else {
        body_param.and_then(|param| source.body(op, graph, param))
    };

    // required values, in declaration order
    for param in &op.parameters {
        if param.location == ParamLocation::Body {
            if multipart || !param.required {
                continue;
            }
            match &body_value {
                None => return Err(missing(op, &param.name)),
                Some(body) => {
                    if let (Some(fields), Value::Object(map)) = (graph.object_fields(param.ty), body) {
                        if let Some(field) = fields
                            .iter()
                            .find(|f| f.required && map.get(&f.name).map_or(true, Value::is_null))
                        {
                            return Err(missing(op, &field.name));
                        }
                    }
                }
            }
        } else if param.required && source.value(param).map_or(true, Value::is_null) {
            return Err(missing(op, &param.name));
        }
    }

    let body = match (multipart, &args.form) {
        (true, Some(form)) => RequestBody::Form(form.clone()),
        (true, None) => {
            if body_param.is_some_and(|p| p.required) || source.has_body_values(op) {
                return Err(ClientError::FormDataRequired {
                    operation: op.id.clone(),
                });
            }
            RequestBody::Empty
        }
        (false, Some(_)) => {
            return Err(ClientError::wrong_option(
                "body",
                format!("operation {} does not take a multipart form", op.id),
            ))
        }
        (false, None) => match (body_value, body_param) {
            (Some(body), Some(param)) => {
                check(graph, param.ty, &body).map_err(|e| ClientError::wrong_option("body", e))?;
                encode_body(op, body)?
            }
            _ => RequestBody::Empty,
        },
    };

    let mut headers = HeaderSet::new();
    let mut query = Vec::new();
    let mut path_values = Map::new();
    for param in op.parameters.iter().filter(|p| p.location != ParamLocation::Body) {
        let Some(value) = source.value(param).filter(|v| !v.is_null()) else {
            continue;
        };
        if !param_value_fits(graph, param.ty, value) {
            return Err(ClientError::wrong_option(
                param.name.clone(),
                format!("unexpected {} for parameter of operation {}", kind_name(value), op.id),
            ));
        }
        match param.location {
            ParamLocation::Path => {
                path_values.insert(param.name.clone(), value.clone());
            }
            ParamLocation::Query => query.push((param.name.clone(), value.clone())),
            ParamLocation::Header => match value {
                Value::Array(items) => headers.insert(
                    &param.name,
                    items.iter().map(scalar_text).collect::<Vec<_>>().join(","),
                ),
                other => headers.insert(&param.name, scalar_text(other)),
            },
            ParamLocation::Body => {}
        }
    }

    Ok(BoundRequest {
        segments: substitute_path(&op.path, &path_values),
        query,
        headers,
        body,
    })
}

/// Where parameter values are looked up
enum ArgSource<'a> {
    Flat(&'a Map<String, Value>),
    Envelope {
        path: &'a Map<String, Value>,
        query: &'a Map<String, Value>,
        headers: &'a Map<String, Value>,
        body: Option<&'a Value>,
    },
}

impl<'a> ArgSource<'a> {
    fn envelope(values: &'a Map<String, Value>, empty: &'a Map<String, Value>) -> Result<Self> {
        if let Some(key) = values.keys().find(|k| !ENVELOPE_KEYS.contains(&k.as_str())) {
            return Err(ClientError::wrong_option(
                key.clone(),
                "full requests take only path, query, headers and body",
            ));
        }
        let group = |key: &str| -> Result<&'a Map<String, Value>> {
            match values.get(key) {
                None | Some(Value::Null) => Ok(empty),
                Some(Value::Object(map)) => Ok(map),
                Some(other) => Err(ClientError::wrong_option(
                    key,
                    format!("expected an object, got {}", kind_name(other)),
                )),
            }
        };
        Ok(ArgSource::Envelope {
            path: group("path")?,
            query: group("query")?,
            headers: group("headers")?,
            body: values.get("body").filter(|v| !v.is_null()),
        })
    }

    fn value(&self, param: &Parameter) -> Option<&'a Value> {
        match *self {
            ArgSource::Flat(values) => values.get(&param.name),
            ArgSource::Envelope {
                path,
                query,
                headers,
                ..
            } => match param.location {
                ParamLocation::Path => path.get(&param.name),
                ParamLocation::Query => query.get(&param.name),
                ParamLocation::Header => headers
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(&param.name))
                    .map(|(_, v)| v),
                ParamLocation::Body => None,
            },
        }
    }

    /// Values that can only be meant as the request body
    fn has_body_values(&self, op: &Operation) -> bool {
        match self {
            ArgSource::Flat(values) => values.keys().any(|key| {
                !op.parameters
                    .iter()
                    .any(|p| p.location != ParamLocation::Body && &p.name == key)
            }),
            ArgSource::Envelope { body, .. } => body.is_some(),
        }
    }

    /// JSON body: the envelope's `body`, or in flat mode the values left
    /// over after parameters (object bodies) or the `body` key (others)
    fn body(&self, op: &Operation, graph: &TypeGraph, param: &Parameter) -> Option<Value> {
        match self {
            ArgSource::Envelope { body, .. } => body.cloned(),
            ArgSource::Flat(values) => {
                if graph.object_fields(param.ty).is_none() {
                    return values.get("body").filter(|v| !v.is_null()).cloned();
                }
                let rest: Map<String, Value> = values
                    .iter()
                    .filter(|(key, _)| {
                        !op.parameters
                            .iter()
                            .any(|p| p.location != ParamLocation::Body && &p.name == *key)
                    })
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                if rest.is_empty() && !param.required {
                    None
                } else {
                    Some(Value::Object(rest))
                }
            }
        }
    }
}

/// Encode a checked body the way the operation declares it
fn encode_body(op: &Operation, body: Value) -> Result<RequestBody> {
    let Some(content) = &op.content_type else {
        return Ok(RequestBody::Json(body));
    };
    match content.kind {
        ContentKind::Json | ContentKind::Multipart => Ok(RequestBody::Json(body)),
        ContentKind::FormUrlEncoded => match &body {
            Value::Object(fields) => Ok(RequestBody::FormUrlEncoded(encode_form(fields))),
            other => Err(ClientError::wrong_option(
                "body",
                format!("form-encoded body must be an object, got {}", kind_name(other)),
            )),
        },
        ContentKind::Other => Ok(RequestBody::Raw {
            content_type: content.media_type.clone(),
            bytes: match body {
                Value::String(text) => text.into_bytes(),
                other => other.to_string().into_bytes(),
            },
        }),
    }
}

fn missing(op: &Operation, param: &str) -> ClientError {
    ClientError::MissingParamsRequired {
        operation: op.id.clone(),
        param: param.to_string(),
    }
}

/// Path, query and header values are scalars, or arrays of scalars for
/// array-typed parameters
fn param_value_fits(graph: &TypeGraph, ty: TypeId, value: &Value) -> bool {
    let scalar = |v: &Value| matches!(v, Value::String(_) | Value::Number(_) | Value::Bool(_));
    match graph.kind(graph.resolve(ty)) {
        TypeKind::Array(_) => scalar(value) || value.as_array().is_some_and(|items| items.iter().all(scalar)),
        TypeKind::Object(_) | TypeKind::Map(_) => value.is_object(),
        TypeKind::Unknown | TypeKind::Union(_) => true,
        TypeKind::Primitive(_) | TypeKind::Enum(_) => scalar(value),
    }
}

/// Split a path template into decoded segments with placeholders filled in
fn substitute_path(template: &str, values: &Map<String, Value>) -> Vec<String> {
    template
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut out = String::new();
            let mut rest = segment;
            while let Some(start) = rest.find('{') {
                let Some(len) = rest[start..].find('}') else {
                    break;
                };
                out.push_str(&rest[..start]);
                let name = &rest[start + 1..start + len];
                match values.get(name) {
                    Some(value) => out.push_str(&scalar_text(value)),
                    None => out.push_str(&rest[start..=start + len]),
                }
                rest = &rest[start + len + 1..];
            }
            out.push_str(rest);
            out
        })
        .collect()
}

pub(crate) fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clientgen_common::{
        ContentKind, Field, HttpMethod, Primitive, RequestContent, TypeGraph,
    };
    use serde_json::json;

    fn param(name: &str, location: ParamLocation, required: bool, ty: TypeId) -> Parameter {
        Parameter {
            name: name.to_string(),
            location,
            required,
            ty,
            description: None,
        }
    }

    fn operation(id: &str, path: &str, parameters: Vec<Parameter>) -> Operation {
        Operation {
            id: id.to_string(),
            operation_id: Some(id.to_string()),
            method: HttpMethod::Get,
            path: path.to_string(),
            summary: None,
            parameters,
            content_type: None,
            responses: vec![],
        }
    }

    #[test]
    fn test_path_query_and_headers() {
        let mut graph = TypeGraph::new();
        let number = graph.primitive(Primitive::Number);
        let string = graph.primitive(Primitive::String);
        let tags = graph.add(TypeKind::Array(string));
        let op = operation(
            "getQuote",
            "/movies/{id}/quotes/{quoteId}",
            vec![
                param("id", ParamLocation::Path, true, number),
                param("quoteId", ParamLocation::Path, true, string),
                param("tags", ParamLocation::Query, false, tags),
                param("X-Trace", ParamLocation::Header, false, string),
            ],
        );
        let args = CallArgs::new(json!({
            "id": 1,
            "quoteId": "a/b",
            "tags": ["x", "y"],
            "X-Trace": "abc"
        }));

        let bound = bind(&op, &graph, &args, false).unwrap();
        assert_eq!(bound.segments, vec!["movies", "1", "quotes", "a/b"]);
        assert_eq!(bound.query, vec![("tags".to_string(), json!(["x", "y"]))]);
        assert_eq!(bound.headers.get("x-trace"), Some("abc"));
        assert_eq!(bound.body, RequestBody::Empty);
    }

    #[test]
    fn test_first_missing_parameter_is_reported() {
        let mut graph = TypeGraph::new();
        let number = graph.primitive(Primitive::Number);
        let op = operation(
            "getQuote",
            "/movies/{id}/quotes/{quoteId}",
            vec![
                param("id", ParamLocation::Path, true, number),
                param("quoteId", ParamLocation::Path, true, number),
            ],
        );

        let error = bind(&op, &graph, &CallArgs::new(json!({"id": "1"})), false).unwrap_err();
        match error {
            ClientError::MissingParamsRequired { param, operation } => {
                assert_eq!(param, "quoteId");
                assert_eq!(operation, "getQuote");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let error = bind(&op, &graph, &CallArgs::new(json!({"quoteId": null})), false).unwrap_err();
        assert!(matches!(error, ClientError::MissingParamsRequired { param, .. } if param == "id"));
    }

    #[test]
    fn test_wrong_argument_types() {
        let mut graph = TypeGraph::new();
        let number = graph.primitive(Primitive::Number);
        let op = operation("getMovie", "/movies/{id}", vec![param("id", ParamLocation::Path, true, number)]);

        let error = bind(&op, &graph, &CallArgs::new(json!({"id": {"nested": 1}})), false).unwrap_err();
        assert!(matches!(error, ClientError::WrongOptionType { option, .. } if option == "id"));

        let error = bind(&op, &graph, &CallArgs::new(json!([1])), false).unwrap_err();
        assert!(matches!(error, ClientError::WrongOptionType { option, .. } if option == "args"));
    }

    #[test]
    fn test_flat_object_body() {
        let mut graph = TypeGraph::new();
        let number = graph.primitive(Primitive::Number);
        let string = graph.primitive(Primitive::String);
        let input = graph.reserve_named("MovieInput");
        graph.set_kind(
            input,
            TypeKind::Object(vec![
                Field::new("title", string, true),
                Field::new("year", number, false),
            ]),
        );
        let mut op = operation(
            "updateMovie",
            "/movies/{id}",
            vec![
                param("id", ParamLocation::Path, true, number),
                param("body", ParamLocation::Body, true, input),
            ],
        );
        op.method = HttpMethod::Put;
        op.content_type = Some(RequestContent {
            kind: ContentKind::Json,
            media_type: "application/json".to_string(),
        });

        let bound = bind(
            &op,
            &graph,
            &CallArgs::new(json!({"id": 7, "title": "Heat", "year": 1995})),
            false,
        )
        .unwrap();
        assert_eq!(bound.segments, vec!["movies", "7"]);
        assert_eq!(bound.body, RequestBody::Json(json!({"title": "Heat", "year": 1995})));

        let error = bind(&op, &graph, &CallArgs::new(json!({"id": 7, "year": 1995})), false).unwrap_err();
        assert!(matches!(error, ClientError::MissingParamsRequired { param, .. } if param == "title"));

        let error = bind(
            &op,
            &graph,
            &CallArgs::new(json!({"id": 7, "title": 12})),
            false,
        )
        .unwrap_err();
        assert!(matches!(error, ClientError::WrongOptionType { option, .. } if option == "body"));

        let error = bind(
            &op,
            &graph,
            &CallArgs::new(json!({"id": 7, "title": "Heat"})).form(FormData::new()),
            false,
        )
        .unwrap_err();
        assert!(matches!(error, ClientError::WrongOptionType { option, .. } if option == "body"));
    }

    #[test]
    fn test_full_request_envelope() {
        let mut graph = TypeGraph::new();
        let number = graph.primitive(Primitive::Number);
        let string = graph.primitive(Primitive::String);
        let op = operation(
            "getMovie",
            "/movies/{id}",
            vec![
                param("id", ParamLocation::Path, true, number),
                param("lang", ParamLocation::Query, false, string),
                param("x-source", ParamLocation::Header, false, string),
            ],
        );

        let args = CallArgs::new(json!({
            "path": {"id": 3},
            "query": {"lang": "en"},
            "headers": {"X-Source": "tests"}
        }));
        let bound = bind(&op, &graph, &args, true).unwrap();
        assert_eq!(bound.segments, vec!["movies", "3"]);
        assert_eq!(bound.query, vec![("lang".to_string(), json!("en"))]);
        assert_eq!(bound.headers.get("x-source"), Some("tests"));

        // flat values are not looked up in full-request mode
        let error = bind(&op, &graph, &CallArgs::new(json!({"id": 3})), true).unwrap_err();
        assert!(matches!(error, ClientError::WrongOptionType { option, .. } if option == "id"));

        let error = bind(&op, &graph, &CallArgs::new(json!({"path": {}})), true).unwrap_err();
        assert!(matches!(error, ClientError::MissingParamsRequired { param, .. } if param == "id"));
    }

    #[test]
    fn test_multipart_requires_form() {
        let mut graph = TypeGraph::new();
        let number = graph.primitive(Primitive::Number);
        let unknown = graph.unknown();
        let mut op = operation(
            "uploadPoster",
            "/movies/{id}/poster",
            vec![
                param("id", ParamLocation::Path, true, number),
                param("body", ParamLocation::Body, true, unknown),
            ],
        );
        op.content_type = Some(RequestContent {
            kind: ContentKind::Multipart,
            media_type: "multipart/form-data".to_string(),
        });

        let error = bind(&op, &graph, &CallArgs::new(json!({"id": 1, "file": "not-a-form"})), false).unwrap_err();
        assert!(matches!(error, ClientError::FormDataRequired { .. }));

        let form = FormData::new().text("caption", "poster");
        let bound = bind(&op, &graph, &CallArgs::new(json!({"id": 1})).form(form.clone()), false).unwrap();
        assert_eq!(bound.body, RequestBody::Form(form));
    }

    #[test]
    fn test_optional_multipart_body_still_requires_form() {
        let mut graph = TypeGraph::new();
        let number = graph.primitive(Primitive::Number);
        let unknown = graph.unknown();
        let mut op = operation(
            "upload",
            "/files/{id}",
            vec![
                param("id", ParamLocation::Path, true, number),
                param("body", ParamLocation::Body, false, unknown),
            ],
        );
        op.method = HttpMethod::Post;
        op.content_type = Some(RequestContent {
            kind: ContentKind::Multipart,
            media_type: "multipart/form-data".to_string(),
        });

        let error = bind(&op, &graph, &CallArgs::new(json!({"id": 1, "file": "not-a-form"})), false).unwrap_err();
        assert!(matches!(error, ClientError::FormDataRequired { operation } if operation == "upload"));

        let error = bind(&op, &graph, &CallArgs::new(json!({"path": {"id": 1}, "body": "x"})), true).unwrap_err();
        assert!(matches!(error, ClientError::FormDataRequired { .. }));

        // nothing meant as a body: the optional form is left out
        let bound = bind(&op, &graph, &CallArgs::new(json!({"id": 1})), false).unwrap();
        assert_eq!(bound.body, RequestBody::Empty);
    }

    #[test]
    fn test_form_urlencoded_body() {
        let mut graph = TypeGraph::new();
        let string = graph.primitive(Primitive::String);
        let tags = graph.add(TypeKind::Array(string));
        let login = graph.add(TypeKind::Object(vec![
            Field::new("user", string, true),
            Field::new("tags", tags, false),
        ]));
        let mut op = operation("login", "/login", vec![param("body", ParamLocation::Body, true, login)]);
        op.method = HttpMethod::Post;
        op.content_type = Some(RequestContent {
            kind: ContentKind::FormUrlEncoded,
            media_type: "application/x-www-form-urlencoded".to_string(),
        });

        let bound = bind(
            &op,
            &graph,
            &CallArgs::new(json!({"user": "ann lee", "tags": ["a", "b"]})),
            false,
        )
        .unwrap();
        assert_eq!(
            bound.body,
            RequestBody::FormUrlEncoded("tags=a&tags=b&user=ann+lee".to_string())
        );

        let error = bind(&op, &graph, &CallArgs::new(json!({"tags": []})), false).unwrap_err();
        assert!(matches!(error, ClientError::MissingParamsRequired { param, .. } if param == "user"));
    }

    #[test]
    fn test_other_media_types_are_sent_raw() {
        let mut graph = TypeGraph::new();
        let string = graph.primitive(Primitive::String);
        let mut op = operation("putNote", "/note", vec![param("body", ParamLocation::Body, true, string)]);
        op.method = HttpMethod::Put;
        op.content_type = Some(RequestContent {
            kind: ContentKind::Other,
            media_type: "text/plain".to_string(),
        });

        let bound = bind(&op, &graph, &CallArgs::new(json!({"body": "hello"})), false).unwrap();
        assert_eq!(
            bound.body,
            RequestBody::Raw {
                content_type: "text/plain".to_string(),
                bytes: b"hello".to_vec(),
            }
        );
    }

    #[test]
    fn test_substitute_path() {
        let values = json!({"id": 5, "name": "x y"});
        let values = values.as_object().unwrap();
        assert_eq!(substitute_path("/a/{id}.json/{name}", values), vec!["a", "5.json", "x y"]);
        assert_eq!(substitute_path("/", values), Vec::<String>::new());
        assert_eq!(substitute_path("/a/{missing}", values), vec!["a", "{missing}"]);
    }
}
