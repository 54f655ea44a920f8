//! Per-operation request and response types, and the views the binding
//! templates render operations from

use crate::render::{doc_comment, TypeRenderer};
use clientgen_common::naming::{property_key, quote, type_name, value_name};
use clientgen_common::{EmitOptions, Operation, ParamLocation, ResponseSpec, StatusKey};
use serde::Serialize;
use std::collections::BTreeSet;

/// Names already taken in one emitted namespace
#[derive(Debug, Default)]
pub struct NameSpace {
    used: BTreeSet<String>,
}

impl NameSpace {
    pub fn new<I, S>(taken: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            used: taken.into_iter().map(Into::into).collect(),
        }
    }

    /// Take `candidate`, or the first free `candidate2`, `candidate3`, ...
    pub fn claim(&mut self, candidate: &str) -> String {
        let mut name = candidate.to_string();
        let mut n = 2;
        while self.used.contains(&name) {
            name = format!("{}{}", candidate, n);
            n += 1;
        }
        self.used.insert(name.clone());
        name
    }
}

struct Member {
    name: String,
    required: bool,
    ty: String,
}

/// Declarations generated for one operation
pub struct OperationTypes {
    pub request: String,
    pub responses: String,
    /// Every member of the request type is optional
    pub request_optional: bool,
    pub declarations: Vec<String>,
}

/// Build the request, per-status response, and response union types of an operation
pub fn operation_types(
    renderer: &TypeRenderer<'_>,
    op: &Operation,
    options: &EmitOptions,
    names: &mut NameSpace,
) -> OperationTypes {
    let base = type_name(&op.id);
    let mut declarations = Vec::new();

    let members = if options.full_request {
        envelope_members(renderer, op)
    } else {
        flat_members(renderer, op)
    };
    let request_optional = members
        .iter()
        .all(|m| !m.required && options.props_optional);
    let request = names.claim(&format!("{}Request", base));
    declarations.push(interface(renderer, &request, &members));

    let mut response_names = Vec::new();
    for response in &op.responses {
        let name = names.claim(&format!("{}Response{}", base, response.status.label()));
        let body = response_body(renderer, response);
        let declaration = if options.full_response {
            let status = match response.status {
                StatusKey::Code(code) => code.to_string(),
                StatusKey::Range(_) | StatusKey::Default => "number".to_string(),
            };
            let members = vec![
                Member {
                    name: "statusCode".to_string(),
                    required: true,
                    ty: status,
                },
                Member {
                    name: "headers".to_string(),
                    required: true,
                    ty: "Record<string, string>".to_string(),
                },
                Member {
                    name: "body".to_string(),
                    required: true,
                    ty: body,
                },
            ];
            interface(renderer, &name, &members)
        } else {
            format!("export type {} = {};", name, body)
        };
        declarations.push(declaration);
        response_names.push(name);
    }

    let responses = names.claim(&format!("{}Responses", base));
    let union = if response_names.is_empty() {
        "unknown".to_string()
    } else {
        response_names.join(" | ")
    };
    declarations.push(format!("export type {} = {};", responses, union));

    OperationTypes {
        request,
        responses,
        request_optional,
        declarations,
    }
}

/// Parameters by name, with the fields of an object body merged in
fn flat_members(renderer: &TypeRenderer<'_>, op: &Operation) -> Vec<Member> {
    let mut members: Vec<Member> = op
        .parameters
        .iter()
        .filter(|p| p.location != ParamLocation::Body)
        .map(|p| Member {
            name: p.name.clone(),
            required: p.required,
            ty: renderer.expr(p.ty),
        })
        .collect();

    let Some(body) = op.body() else {
        return members;
    };
    let mut push = |member: Member| {
        if !members.iter().any(|m| m.name == member.name) {
            members.push(member);
        }
    };
    match renderer.object_fields(body.ty) {
        _ if op.is_multipart() => push(Member {
            name: "body".to_string(),
            required: body.required,
            ty: "FormData".to_string(),
        }),
        Some(fields) => {
            for field in fields {
                push(Member {
                    name: field.name.clone(),
                    required: field.required && body.required,
                    ty: renderer.expr(field.ty),
                });
            }
        }
        None => push(Member {
            name: "body".to_string(),
            required: body.required,
            ty: renderer.expr(body.ty),
        }),
    }
    members
}

/// `{ path, query, headers, body }`
fn envelope_members(renderer: &TypeRenderer<'_>, op: &Operation) -> Vec<Member> {
    let mut members = Vec::new();
    for (location, key) in [
        (ParamLocation::Path, "path"),
        (ParamLocation::Query, "query"),
        (ParamLocation::Header, "headers"),
    ] {
        let params: Vec<_> = op.params_in(location).collect();
        if params.is_empty() {
            continue;
        }
        let fields: Vec<String> = params
            .iter()
            .map(|p| renderer.member(&p.name, p.required, &renderer.expr(p.ty)))
            .collect();
        members.push(Member {
            name: key.to_string(),
            required: params.iter().any(|p| p.required),
            ty: format!("{{ {} }}", fields.join("; ")),
        });
    }
    if let Some(body) = op.body() {
        let ty = if op.is_multipart() {
            "FormData".to_string()
        } else {
            renderer.expr(body.ty)
        };
        members.push(Member {
            name: "body".to_string(),
            required: body.required,
            ty,
        });
    }
    members
}

fn interface(renderer: &TypeRenderer<'_>, name: &str, members: &[Member]) -> String {
    if members.is_empty() {
        return format!("export interface {} {{}}", name);
    }
    let mut out = format!("export interface {} {{\n", name);
    for member in members {
        out.push_str(&format!(
            "  {};\n",
            renderer.member(&member.name, member.required, &member.ty)
        ));
    }
    out.push('}');
    out
}

/// JSON body type of a response, or the first typed media, or `unknown`
fn response_body(renderer: &TypeRenderer<'_>, response: &ResponseSpec) -> String {
    response
        .content
        .iter()
        .filter(|m| m.ty.is_some())
        .find(|m| m.is_json())
        .or_else(|| response.content.iter().find(|m| m.ty.is_some()))
        .and_then(|m| m.ty)
        .map(|ty| renderer.expr(ty))
        .unwrap_or_else(|| "unknown".to_string())
}

/// An operation as the binding templates see it
#[derive(Debug, Clone, Serialize)]
pub struct OperationView {
    pub id: String,
    /// Object key for the operation id
    pub key: String,
    /// Function name in frontend bindings
    pub function: String,
    pub method_literal: String,
    pub path: String,
    pub doc: String,
    pub request_type: String,
    pub return_type: String,
    pub request_optional: bool,
    pub path_expr: String,
    pub query_expr: String,
    pub headers_expr: String,
    pub body_expr: String,
    pub multipart: bool,
}

impl OperationView {
    pub fn new(
        renderer: &TypeRenderer<'_>,
        op: &Operation,
        types: &OperationTypes,
        function: String,
        full_request: bool,
    ) -> Self {
        Self {
            id: op.id.clone(),
            key: property_key(&op.id),
            function,
            method_literal: quote(op.method.as_str()),
            path: op.path.clone(),
            doc: doc_comment(op.summary.as_deref(), ""),
            request_type: types.request.clone(),
            return_type: format!("Promise<{}>", types.responses),
            request_optional: types.request_optional,
            path_expr: path_expr(&op.path, full_request),
            query_expr: group_expr(op, ParamLocation::Query, "query", full_request),
            headers_expr: group_expr(op, ParamLocation::Header, "headers", full_request),
            body_expr: body_expr(renderer, op, full_request),
            multipart: op.is_multipart(),
        }
    }
}

/// Frontend function name for an operation id
pub fn function_name(op: &Operation, names: &mut NameSpace) -> String {
    names.claim(&value_name(&op.id))
}

fn accessor(full_request: bool, group: &str, name: &str) -> String {
    if full_request {
        format!("request.{}?.[{}]", group, quote(name))
    } else {
        format!("request[{}]", quote(name))
    }
}

/// JavaScript template literal building the request path
fn path_expr(path: &str, full_request: bool) -> String {
    let mut out = String::from("`");
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            break;
        };
        out.push_str(&escape_template(&rest[..start]));
        out.push_str(&format!(
            "${{encodeURIComponent(String({}))}}",
            accessor(full_request, "path", &after[..end])
        ));
        rest = &after[end + 1..];
    }
    out.push_str(&escape_template(rest));
    out.push('`');
    out
}

fn escape_template(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}

fn group_expr(op: &Operation, location: ParamLocation, group: &str, full_request: bool) -> String {
    if full_request {
        return format!("request.{}", group);
    }
    let entries: Vec<String> = op
        .params_in(location)
        .map(|p| format!("{}: {}", quote(&p.name), accessor(false, group, &p.name)))
        .collect();
    if entries.is_empty() {
        "undefined".to_string()
    } else {
        format!("{{ {} }}", entries.join(", "))
    }
}

fn body_expr(renderer: &TypeRenderer<'_>, op: &Operation, full_request: bool) -> String {
    let Some(body) = op.body() else {
        return "undefined".to_string();
    };
    if full_request {
        return "request.body".to_string();
    }
    if op.is_multipart() || renderer.object_fields(body.ty).is_none() {
        return accessor(false, "body", "body");
    }
    let params: Vec<String> = op
        .parameters
        .iter()
        .filter(|p| p.location != ParamLocation::Body)
        .map(|p| quote(&p.name))
        .collect();
    format!("omit(request, [{}])", params.join(", "))
}
