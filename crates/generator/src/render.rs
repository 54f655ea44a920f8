//! TypeScript type expressions and declarations for type graph nodes
//!
//! Rendering rules, which the declaration re-parser relies on:
//! - named nodes are always written by name
//! - anonymous enums and multi-member unions are parenthesized inside a
//!   union or before `[]`
//! - objects declared at top level become `export interface`, everything
//!   else `export type Name = ...;`

use clientgen_common::naming::property_key;
use clientgen_common::{EmitOptions, Field, Primitive, TypeGraph, TypeId, TypeKind, UnionStyle};

/// Renders type graph nodes as TypeScript
pub struct TypeRenderer<'a> {
    graph: &'a TypeGraph,
    props_optional: bool,
    union_style: UnionStyle,
}

impl<'a> TypeRenderer<'a> {
    pub fn new(graph: &'a TypeGraph, options: &EmitOptions) -> Self {
        Self {
            graph,
            props_optional: options.props_optional,
            union_style: options.union_style,
        }
    }

    pub fn graph(&self) -> &'a TypeGraph {
        self.graph
    }

    /// Type expression referring to a node
    pub fn expr(&self, id: TypeId) -> String {
        match self.graph.name_of(id) {
            Some(name) => name.to_string(),
            None => self.kind_expr(self.graph.kind(id)),
        }
    }

    /// `export interface` / `export type` declaration of a named node
    pub fn declaration(&self, id: TypeId) -> Option<String> {
        let node = self.graph.node(id);
        let name = node.name.as_deref()?;

        let mut out = doc_comment(node.description.as_deref(), "");
        match &node.kind {
            TypeKind::Object(fields) if fields.is_empty() => {
                out.push_str(&format!("export interface {} {{}}", name));
            }
            TypeKind::Object(fields) => {
                out.push_str(&format!("export interface {} {{\n", name));
                for field in fields {
                    out.push_str(&doc_comment(field.description.as_deref(), "  "));
                    out.push_str(&format!("  {};\n", self.field(field)));
                }
                out.push('}');
            }
            kind => out.push_str(&format!("export type {} = {};", name, self.kind_expr(kind))),
        }
        Some(out)
    }

    /// One interface member, without the trailing `;`
    pub fn member(&self, name: &str, required: bool, ty: &str) -> String {
        let optional = if required || !self.props_optional {
            ""
        } else {
            "?"
        };
        format!("{}{}: {}", property_key(name), optional, ty)
    }

    /// Fields of an object node, looking through aliases
    pub fn object_fields(&self, id: TypeId) -> Option<&'a [Field]> {
        self.graph.object_fields(id)
    }

    fn field(&self, field: &Field) -> String {
        self.member(&field.name, field.required, &self.expr(field.ty))
    }

    fn kind_expr(&self, kind: &TypeKind) -> String {
        match kind {
            TypeKind::Unknown => "unknown".to_string(),
            TypeKind::Primitive(p) => p.as_str().to_string(),
            TypeKind::Object(fields) => self.inline_object(fields),
            TypeKind::Map(value) => format!("Record<string, {}>", self.expr(*value)),
            TypeKind::Array(item) => format!("{}[]", self.grouped(*item)),
            TypeKind::Enum(values) => values.iter().map(literal).collect::<Vec<_>>().join(" | "),
            TypeKind::Union(members) => match self.union_style {
                UnionStyle::Native => members
                    .iter()
                    .map(|m| self.union_member(*m))
                    .collect::<Vec<_>>()
                    .join(" | "),
                UnionStyle::Widened if members.len() > 1 => self.widened(members),
                UnionStyle::Widened => members
                    .iter()
                    .map(|m| self.expr(*m))
                    .collect::<Vec<_>>()
                    .join(" | "),
            },
        }
    }

    fn inline_object(&self, fields: &[Field]) -> String {
        if fields.is_empty() {
            return "{}".to_string();
        }
        let members: Vec<String> = fields.iter().map(|f| self.field(f)).collect();
        format!("{{ {} }}", members.join("; "))
    }

    /// Expression safe to place before `[]`
    fn grouped(&self, id: TypeId) -> String {
        let expr = self.expr(id);
        if self.graph.name_of(id).is_some() {
            return expr;
        }
        match self.graph.kind(id) {
            TypeKind::Enum(values) if values.len() > 1 => format!("({})", expr),
            TypeKind::Union(members) if members.len() > 1 => format!("({})", expr),
            _ => expr,
        }
    }

    /// Expression safe to place between `|`
    fn union_member(&self, id: TypeId) -> String {
        let expr = self.expr(id);
        if self.graph.name_of(id).is_some() {
            return expr;
        }
        match self.graph.kind(id) {
            TypeKind::Enum(_) => format!("({})", expr),
            TypeKind::Union(members) if members.len() > 1 => format!("({})", expr),
            _ => expr,
        }
    }

    fn widened(&self, members: &[TypeId]) -> String {
        let listed: Vec<String> = members.iter().map(|m| self.expr(*m)).collect();
        format!(
            "{} /* one of: {} */",
            self.common_shape(members),
            listed.join(" | ").replace("*/", "*\\/")
        )
    }

    /// Broadest shape shared by every non-null member
    fn common_shape(&self, members: &[TypeId]) -> String {
        let kinds: Vec<&TypeKind> = members
            .iter()
            .map(|m| self.resolve(*m))
            .filter(|k| **k != TypeKind::Primitive(Primitive::Null))
            .collect();
        let Some((first, rest)) = kinds.split_first() else {
            return "null".to_string();
        };

        match first {
            TypeKind::Object(fields) => {
                let objects: Option<Vec<&Vec<Field>>> = rest
                    .iter()
                    .map(|k| match k {
                        TypeKind::Object(other) => Some(other),
                        _ => None,
                    })
                    .collect();
                let Some(objects) = objects else {
                    return "unknown".to_string();
                };
                let common: Vec<Field> = fields
                    .iter()
                    .filter_map(|field| {
                        let mut shared = field.clone();
                        for other in &objects {
                            let matching = other.iter().find(|f| f.name == field.name)?;
                            shared.required &= matching.required;
                        }
                        Some(shared)
                    })
                    .collect();
                self.inline_object(&common)
            }
            TypeKind::Array(_) if rest.iter().all(|k| matches!(k, TypeKind::Array(_))) => {
                "unknown[]".to_string()
            }
            _ => {
                let base = scalar_base(first);
                if base.is_some() && rest.iter().all(|k| scalar_base(k) == base) {
                    base.map(Primitive::as_str).unwrap_or("unknown").to_string()
                } else {
                    "unknown".to_string()
                }
            }
        }
    }

    fn resolve(&self, mut id: TypeId) -> &'a TypeKind {
        for _ in 0..self.graph.len() {
            match self.graph.kind(id) {
                TypeKind::Union(members) if members.len() == 1 => id = members[0],
                _ => break,
            }
        }
        self.graph.kind(id)
    }
}

/// Primitive a scalar kind (or an enum of uniform literals) widens to
fn scalar_base(kind: &TypeKind) -> Option<Primitive> {
    let of_value = |value: &serde_json::Value| match value {
        serde_json::Value::String(_) => Some(Primitive::String),
        serde_json::Value::Number(_) => Some(Primitive::Number),
        serde_json::Value::Bool(_) => Some(Primitive::Boolean),
        _ => None,
    };
    match kind {
        TypeKind::Primitive(p) => Some(*p),
        TypeKind::Enum(values) => {
            let first = of_value(values.first()?)?;
            values
                .iter()
                .all(|v| of_value(v) == Some(first))
                .then_some(first)
        }
        _ => None,
    }
}

/// JSON literal as a TypeScript literal type
pub fn literal(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => "unknown".to_string(),
        scalar => scalar.to_string(),
    }
}

/// `/** ... */` block for a description, empty when there is none
pub fn doc_comment(text: Option<&str>, indent: &str) -> String {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return String::new();
    };
    let text = text.replace("*/", "*\\/");
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() == 1 {
        return format!("{}/** {} */\n", indent, lines[0]);
    }
    let mut out = format!("{}/**\n", indent);
    for line in lines {
        out.push_str(&format!("{} * {}\n", indent, line.trim_end()).replace(" * \n", " *\n"));
    }
    out.push_str(&format!("{} */\n", indent));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options() -> EmitOptions {
        EmitOptions::default()
    }

    #[test]
    fn test_primitive_and_container_expressions() {
        let mut graph = TypeGraph::new();
        let string = graph.primitive(Primitive::String);
        let array = graph.add(TypeKind::Array(string));
        let map = graph.add(TypeKind::Map(array));
        let renderer = TypeRenderer::new(&graph, &options());

        assert_eq!(renderer.expr(string), "string");
        assert_eq!(renderer.expr(array), "string[]");
        assert_eq!(renderer.expr(map), "Record<string, string[]>");
    }

    #[test]
    fn test_unions_are_grouped() {
        let mut graph = TypeGraph::new();
        let string = graph.primitive(Primitive::String);
        let number = graph.primitive(Primitive::Number);
        let null = graph.primitive(Primitive::Null);
        let either = graph.add(TypeKind::Union(vec![string, number]));
        let nullable = graph.add(TypeKind::Union(vec![either, null]));
        let list = graph.add(TypeKind::Array(either));
        let status = graph.add(TypeKind::Enum(vec![json!("on"), json!("off")]));
        let maybe_status = graph.add(TypeKind::Union(vec![status, null]));
        let renderer = TypeRenderer::new(&graph, &options());

        assert_eq!(renderer.expr(nullable), "(string | number) | null");
        assert_eq!(renderer.expr(list), "(string | number)[]");
        assert_eq!(renderer.expr(status), r#""on" | "off""#);
        assert_eq!(renderer.expr(maybe_status), r#"("on" | "off") | null"#);
    }

    #[test]
    fn test_interface_declaration() {
        let mut graph = TypeGraph::new();
        let movie = graph.reserve_named("Movie");
        let number = graph.primitive(Primitive::Number);
        let mut title = Field::new("title", graph.primitive(Primitive::String), false);
        title.description = Some("Display title".to_string());
        graph.set_kind(
            movie,
            TypeKind::Object(vec![
                Field::new("id", number, true),
                title,
                Field::new("x-rating", number, false),
                Field::new("sequel", movie, false),
            ]),
        );

        let renderer = TypeRenderer::new(&graph, &options());
        assert_eq!(
            renderer.declaration(movie).unwrap(),
            "export interface Movie {\n  id: number;\n  /** Display title */\n  title?: string;\n  \"x-rating\"?: number;\n  sequel?: Movie;\n}"
        );

        let strict = EmitOptions {
            props_optional: false,
            ..EmitOptions::default()
        };
        let renderer = TypeRenderer::new(&graph, &strict);
        assert!(renderer.declaration(movie).unwrap().contains("  title: string;"));
    }

    #[test]
    fn test_empty_interface_on_one_line() {
        let mut graph = TypeGraph::new();
        let empty = graph.reserve_named("Empty");
        graph.set_kind(empty, TypeKind::Object(vec![]));

        let renderer = TypeRenderer::new(&graph, &options());
        let text = renderer.declaration(empty).unwrap();
        assert_eq!(text, "export interface Empty {}");

        let parsed = crate::declarations::parse_declarations(&text).unwrap();
        let id = parsed.lookup("Empty").unwrap();
        assert!(parsed.object_fields(id).is_some_and(|fields| fields.is_empty()));
    }

    #[test]
    fn test_alias_declaration() {
        let mut graph = TypeGraph::new();
        let movie = graph.reserve_named("Movie");
        let film = graph.reserve_named("Film");
        graph.set_kind(film, TypeKind::Union(vec![movie]));
        let null = graph.primitive(Primitive::Null);

        let renderer = TypeRenderer::new(&graph, &options());
        assert_eq!(renderer.declaration(film).unwrap(), "export type Film = Movie;");
        assert_eq!(renderer.declaration(null), None);
    }

    #[test]
    fn test_widened_union() {
        let mut graph = TypeGraph::new();
        let string = graph.primitive(Primitive::String);
        let number = graph.primitive(Primitive::Number);
        let a = graph.reserve_named("A");
        let b = graph.reserve_named("B");
        graph.set_kind(
            a,
            TypeKind::Object(vec![
                Field::new("id", number, true),
                Field::new("name", string, true),
            ]),
        );
        graph.set_kind(
            b,
            TypeKind::Object(vec![
                Field::new("id", number, true),
                Field::new("size", number, true),
            ]),
        );
        let either = graph.add(TypeKind::Union(vec![a, b]));
        let mixed = graph.add(TypeKind::Union(vec![string, number]));

        let widened = EmitOptions {
            union_style: UnionStyle::Widened,
            ..EmitOptions::default()
        };
        let renderer = TypeRenderer::new(&graph, &widened);
        assert_eq!(renderer.expr(either), "{ id: number } /* one of: A | B */");
        assert_eq!(renderer.expr(mixed), "unknown /* one of: string | number */");
    }

    #[test]
    fn test_doc_comment() {
        assert_eq!(doc_comment(None, ""), "");
        assert_eq!(doc_comment(Some("  "), ""), "");
        assert_eq!(doc_comment(Some("Bad */ text"), ""), "/** Bad *\\/ text */\n");
        assert_eq!(
            doc_comment(Some("First\n\nSecond"), "  "),
            "  /**\n   * First\n   *\n   * Second\n   */\n"
        );
    }
}
