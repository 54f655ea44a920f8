//! Integration tests for GraphQL introspection normalization

use clientgen_common::{HttpMethod, ParamLocation, Primitive, SchemaKind, TypeKind};
use clientgen_parser::graphql::{GraphqlParser, GRAPHQL_OPERATION_ID};
use clientgen_parser::normalize_file;
use serde_json::json;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn test_single_pass_through_operation() {
    let api = normalize_file(fixture("movies.introspection.json"), None).unwrap();

    assert_eq!(api.kind, SchemaKind::Graphql);
    assert_eq!(api.operations.len(), 1);

    let op = &api.operations[0];
    assert_eq!(op.id, GRAPHQL_OPERATION_ID);
    assert_eq!(op.method, HttpMethod::Post);
    assert_eq!(op.path, "/graphql");

    let body = op.params_in(ParamLocation::Body).next().unwrap();
    let fields = api.types.object_fields(body.ty).unwrap();
    assert_eq!(fields[0].name, "query");
    assert!(fields[0].required);
    assert_eq!(fields[1].name, "variables");
    assert!(!fields[1].required);

    let roots = api.graphql.as_ref().unwrap();
    assert_eq!(roots.query.as_deref(), Some("Query"));
    assert_eq!(roots.mutation.as_deref(), Some("Mutation"));
    assert_eq!(roots.subscription, None);
}

#[test]
fn test_reachable_types() {
    let api = normalize_file(fixture("movies.introspection.json"), None).unwrap();

    for name in ["Query", "Mutation", "Movie", "Actor", "SearchResult", "MovieInput", "Genre"] {
        assert!(api.types.lookup(name).is_some(), "missing {}", name);
    }
    assert!(api.types.lookup("__Schema").is_none());
    // Scalars are inlined, never named
    assert!(api.types.lookup("String").is_none());
}

#[test]
fn test_type_shapes() {
    let api = normalize_file(fixture("movies.introspection.json"), None).unwrap();
    let types = &api.types;

    let movie = types.lookup("Movie").unwrap();
    assert_eq!(types.node(movie).description.as_deref(), Some("A feature film"));
    let fields = types.object_fields(movie).unwrap();
    assert!(fields[0].required);
    assert_eq!(types.kind(fields[0].ty), &TypeKind::Primitive(Primitive::String));
    assert!(!fields[1].required);
    assert_eq!(fields[2].ty, types.lookup("Genre").unwrap());

    let query = types.lookup("Query").unwrap();
    let movies = &types.object_fields(query).unwrap()[0];
    assert!(movies.required);
    assert_eq!(types.kind(movies.ty), &TypeKind::Array(movie));

    let search = types.lookup("SearchResult").unwrap();
    let actor = types.lookup("Actor").unwrap();
    assert_eq!(types.kind(search), &TypeKind::Union(vec![movie, actor]));

    let genre = types.lookup("Genre").unwrap();
    assert_eq!(
        types.kind(genre),
        &TypeKind::Enum(vec![json!("DRAMA"), json!("COMEDY")])
    );
}

#[test]
fn test_bare_schema_object() {
    let raw = json!({
        "__schema": {
            "queryType": {"name": "Query"},
            "types": [
                {"kind": "OBJECT", "name": "Query", "fields": [
                    {"name": "now", "args": [], "type": {"kind": "SCALAR", "name": "DateTime"}}
                ]}
            ]
        }
    });
    let api = GraphqlParser::from_value(raw).unwrap().parse().unwrap();
    let query = api.types.lookup("Query").unwrap();
    let now = &api.types.object_fields(query).unwrap()[0];
    // Custom scalars have no known shape
    assert_eq!(api.types.kind(now.ty), &TypeKind::Unknown);
}
