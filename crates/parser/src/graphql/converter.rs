//! Converts a GraphQL introspection result to the operation IR
//!
//! GraphQL schemas get a single pass-through operation. Type generation is
//! best effort: every object, input, interface, enum, and union reachable
//! from a root type (field arguments included) becomes a named type.

use super::types::{FullType, IntrospectionKind, IntrospectionSchema, TypeRef};
use clientgen_common::naming::type_name;
use clientgen_common::{
    ApiDefinition, ContentKind, Field, GraphqlRoots, HttpMethod, MediaSpec, Operation,
    ParamLocation, Parameter, Primitive, RequestContent, ResponseSpec, Result, SchemaError,
    SchemaKind, StatusKey, TypeGraph, TypeId, TypeKind,
};
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Identifier of the pass-through operation
pub const GRAPHQL_OPERATION_ID: &str = "graphql";
/// Route of the pass-through operation
pub const GRAPHQL_PATH: &str = "/graphql";

/// Convert an introspection `__schema` to an [`ApiDefinition`]
pub fn convert_graphql_to_api_definition(schema: &IntrospectionSchema) -> Result<ApiDefinition> {
    let roots = GraphqlRoots {
        query: schema.query_type.as_ref().map(|t| t.name.clone()),
        mutation: schema.mutation_type.as_ref().map(|t| t.name.clone()),
        subscription: schema.subscription_type.as_ref().map(|t| t.name.clone()),
    };
    if roots.query.is_none() && roots.mutation.is_none() {
        return Err(SchemaError::ParseFailure(
            "introspection result declares no query or mutation type".to_string(),
        )
        .into());
    }

    let reachable = reachable_types(schema, &roots);
    let mut builder = GraphBuilder::new(schema);
    for name in &reachable {
        builder.reserve(name);
    }
    for name in &reachable {
        builder.define(name);
    }

    let operation = pass_through_operation(&mut builder.graph);

    tracing::debug!(
        types = reachable.len(),
        query = roots.query.as_deref().unwrap_or("-"),
        "normalized GraphQL introspection"
    );

    Ok(ApiDefinition {
        kind: SchemaKind::Graphql,
        title: schema
            .description
            .clone()
            .unwrap_or_else(|| "GraphQL API".to_string()),
        version: String::new(),
        servers: vec![],
        operations: vec![operation],
        types: builder.graph,
        graphql: Some(roots),
    })
}

/// Names of the non-scalar types reachable from the root types, in
/// discovery order
fn reachable_types(schema: &IntrospectionSchema, roots: &GraphqlRoots) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut order = Vec::new();
    let mut queue: VecDeque<String> = [&roots.query, &roots.mutation, &roots.subscription]
        .into_iter()
        .flatten()
        .cloned()
        .collect();

    while let Some(name) = queue.pop_front() {
        if name.starts_with("__") || !seen.insert(name.clone()) {
            continue;
        }
        let Some(full) = schema.find_type(&name) else {
            continue;
        };
        if full.kind == IntrospectionKind::Scalar {
            continue;
        }
        order.push(name);

        let mut refs: Vec<&TypeRef> = Vec::new();
        for field in full.fields.iter().flatten() {
            refs.push(&field.ty);
            refs.extend(field.args.iter().map(|arg| &arg.ty));
        }
        refs.extend(full.input_fields.iter().flatten().map(|f| &f.ty));
        refs.extend(full.possible_types.iter().flatten());
        refs.extend(full.interfaces.iter().flatten());

        queue.extend(refs.into_iter().filter_map(TypeRef::named).map(String::from));
    }
    order
}

struct GraphBuilder<'a> {
    schema: &'a IntrospectionSchema,
    graph: TypeGraph,
    named: HashMap<String, TypeId>,
}

impl<'a> GraphBuilder<'a> {
    fn new(schema: &'a IntrospectionSchema) -> Self {
        Self {
            schema,
            graph: TypeGraph::new(),
            named: HashMap::new(),
        }
    }

    fn reserve(&mut self, name: &str) {
        let unique = self.graph.unique_name(&type_name(name));
        let id = self.graph.reserve_named(unique);
        self.named.insert(name.to_string(), id);
    }

    fn define(&mut self, name: &str) {
        let schema = self.schema;
        let (Some(full), Some(&id)) = (schema.find_type(name), self.named.get(name)) else {
            return;
        };
        let kind = self.kind_of(full);
        self.graph.set_kind(id, kind);
        self.graph.set_description(id, full.description.clone());
    }

    fn kind_of(&mut self, full: &FullType) -> TypeKind {
        match full.kind {
            IntrospectionKind::Object | IntrospectionKind::Interface => {
                let fields = full
                    .fields
                    .iter()
                    .flatten()
                    .map(|f| (f.name.as_str(), &f.ty, f.description.clone()))
                    .collect::<Vec<_>>();
                self.object(fields)
            }
            IntrospectionKind::InputObject => {
                let fields = full
                    .input_fields
                    .iter()
                    .flatten()
                    .map(|f| (f.name.as_str(), &f.ty, f.description.clone()))
                    .collect::<Vec<_>>();
                self.object(fields)
            }
            IntrospectionKind::Enum => TypeKind::Enum(
                full.enum_values
                    .iter()
                    .flatten()
                    .map(|v| serde_json::Value::String(v.name.clone()))
                    .collect(),
            ),
            IntrospectionKind::Union => TypeKind::Union(
                full.possible_types
                    .iter()
                    .flatten()
                    .map(|member| self.type_ref(member))
                    .collect(),
            ),
            _ => TypeKind::Unknown,
        }
    }

    fn object(&mut self, fields: Vec<(&str, &TypeRef, Option<String>)>) -> TypeKind {
        let fields = fields
            .into_iter()
            .map(|(name, ty, description)| {
                let mut field = Field::new(name, self.type_ref(ty), ty.is_non_null());
                field.description = description;
                field
            })
            .collect();
        TypeKind::Object(fields)
    }

    /// Map a wrapped type reference; nullability is carried by the field
    fn type_ref(&mut self, type_ref: &TypeRef) -> TypeId {
        match (type_ref.kind, &type_ref.of_type) {
            (IntrospectionKind::NonNull, Some(inner)) => self.type_ref(inner),
            (IntrospectionKind::List, Some(inner)) => {
                let item = self.type_ref(inner);
                self.graph.add(TypeKind::Array(item))
            }
            _ => match type_ref.name.as_deref() {
                Some(name) => self.named_ref(name),
                None => self.graph.unknown(),
            },
        }
    }

    fn named_ref(&mut self, name: &str) -> TypeId {
        if let Some(id) = self.named.get(name) {
            return *id;
        }
        match name {
            "String" | "ID" => self.graph.primitive(Primitive::String),
            "Int" | "Float" => self.graph.primitive(Primitive::Number),
            "Boolean" => self.graph.primitive(Primitive::Boolean),
            _ => self.graph.unknown(),
        }
    }
}

/// `POST /graphql` taking `{query, variables}`
fn pass_through_operation(graph: &mut TypeGraph) -> Operation {
    let query = graph.primitive(Primitive::String);
    let any = graph.unknown();
    let variables = graph.add(TypeKind::Map(any));
    let body = graph.add(TypeKind::Object(vec![
        Field::new("query", query, true),
        Field::new("variables", variables, false),
    ]));

    let data = graph.unknown();
    let error = graph.unknown();
    let errors = graph.add(TypeKind::Array(error));
    let response = graph.add(TypeKind::Object(vec![
        Field::new("data", data, false),
        Field::new("errors", errors, false),
    ]));

    Operation {
        id: GRAPHQL_OPERATION_ID.to_string(),
        operation_id: None,
        method: HttpMethod::Post,
        path: GRAPHQL_PATH.to_string(),
        summary: Some("GraphQL pass-through".to_string()),
        parameters: vec![Parameter {
            name: "body".to_string(),
            location: ParamLocation::Body,
            required: true,
            ty: body,
            description: None,
        }],
        content_type: Some(RequestContent {
            kind: ContentKind::Json,
            media_type: "application/json".to_string(),
        }),
        responses: vec![ResponseSpec {
            status: StatusKey::Code(200),
            description: None,
            content: vec![MediaSpec {
                media_type: "application/json".to_string(),
                ty: Some(response),
            }],
        }],
    }
}
