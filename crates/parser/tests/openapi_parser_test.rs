//! Integration tests for OpenAPI normalization

use clientgen_common::{
    ContentKind, GeneratorError, HttpMethod, ParamLocation, Primitive, SchemaError, SchemaKind,
    TypeKind,
};
use clientgen_parser::{normalize, normalize_file, OpenApiParser};
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn test_movies_operations_in_path_order() {
    let api = normalize_file(fixture("movies.openapi.json"), None).unwrap();

    assert_eq!(api.kind, SchemaKind::OpenApi);
    assert_eq!(api.title, "Movies API");
    assert_eq!(api.servers, vec!["http://localhost:3042"]);

    let ids: Vec<&str> = api.operations.iter().map(|op| op.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "getHealth",
            "getMovies",
            "createMovie",
            "getMovieById",
            "deleteMovie",
            "uploadPoster",
            "getQuote",
        ]
    );
}

#[test]
fn test_operation_parameters_override_path_parameters() {
    let api = normalize_file(fixture("movies.openapi.json"), None).unwrap();

    let get = api.operation("getMovieById").unwrap();
    let id = get
        .params_in(ParamLocation::Path)
        .find(|p| p.name == "id")
        .unwrap();
    assert_eq!(api.types.kind(id.ty), &TypeKind::Primitive(Primitive::Number));
    assert_eq!(get.params_in(ParamLocation::Path).count(), 1);

    // Cookies are dropped, headers kept
    let headers: Vec<&str> = get
        .params_in(ParamLocation::Header)
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(headers, vec!["x-request-source"]);
    assert!(get.parameters.iter().all(|p| p.name != "session"));

    // Path-level parameter is inherited when not overridden
    let delete = api.operation("deleteMovie").unwrap();
    let id = delete.params_in(ParamLocation::Path).next().unwrap();
    assert_eq!(api.types.kind(id.ty), &TypeKind::Primitive(Primitive::String));
    assert!(id.required);
}

#[test]
fn test_request_bodies() {
    let api = normalize_file(fixture("movies.openapi.json"), None).unwrap();

    let create = api.operation("createMovie").unwrap();
    let body = create.body().unwrap();
    assert!(body.required);
    assert_eq!(api.types.name_of(body.ty), Some("MovieInput"));
    assert_eq!(create.content_type.as_ref().unwrap().kind, ContentKind::Json);

    let upload = api.operation("uploadPoster").unwrap();
    assert!(upload.is_multipart());
    assert_eq!(
        upload.content_type.as_ref().unwrap().media_type,
        "multipart/form-data"
    );
}

#[test]
fn test_responses_and_references() {
    let api = normalize_file(fixture("movies.openapi.json"), None).unwrap();

    let get = api.operation("getMovieById").unwrap();
    let not_found = get.response_for(404).unwrap();
    assert_eq!(not_found.description.as_deref(), Some("Not found"));
    assert_eq!(
        api.types.name_of(not_found.content[0].ty.unwrap()),
        Some("Error")
    );

    // 4XX range covers any client error
    let delete = api.operation("deleteMovie").unwrap();
    assert!(delete.response_for(409).is_some());
    assert!(delete.response_for(204).unwrap().content.is_empty());
    assert!(delete.response_for(500).is_none());

    let health = api.operation("getHealth").unwrap();
    assert_eq!(health.responses[0].content[0].media_type, "text/plain");
}

#[test]
fn test_cycles_are_named_references() {
    let api = normalize_file(fixture("movies.openapi.json"), None).unwrap();

    let movie = api.types.lookup("Movie").unwrap();
    let fields = api.types.object_fields(movie).unwrap();
    let sequel = fields.iter().find(|f| f.name == "sequel").unwrap();
    assert_eq!(sequel.ty, movie);
    assert!(!sequel.required);

    let required: Vec<&str> = fields
        .iter()
        .filter(|f| f.required)
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(required, vec!["id", "title"]);

    let genre = api.types.lookup("Genre").unwrap();
    assert!(matches!(api.types.kind(genre), TypeKind::Enum(values) if values.len() == 3));
}

#[test]
fn test_routes() {
    let api = normalize_file(fixture("movies.openapi.json"), None).unwrap();
    let routes = api.routes();

    assert_eq!(routes.len(), api.operations.len());
    assert_eq!(routes["getQuote"].path, "/movies/{id}/quotes/{quoteId}");
    assert_eq!(routes["getQuote"].method, HttpMethod::Get);
    assert_eq!(routes["createMovie"].method, HttpMethod::Post);
}

#[test]
fn test_normalization_is_deterministic() {
    let first = normalize_file(fixture("movies.openapi.json"), None).unwrap();
    let second = normalize_file(fixture("movies.openapi.json"), None).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_swagger2_yaml() {
    let parser = OpenApiParser::from_file(fixture("petstore.swagger.yaml")).unwrap();
    let api = parser.parse().unwrap();

    assert_eq!(api.servers, vec!["https://petstore.example.com/v2"]);

    let list = api.operation("listPets").unwrap();
    let limit = list.params_in(ParamLocation::Query).next().unwrap();
    assert_eq!(limit.name, "limit");
    assert!(!limit.required);

    let add = api.operation("addPet").unwrap();
    assert_eq!(api.types.name_of(add.body().unwrap().ty), Some("Pet"));
    assert_eq!(add.content_type.as_ref().unwrap().kind, ContentKind::Json);

    let upload = api.operation("uploadPhoto").unwrap();
    assert!(upload.is_multipart());
    let form = upload.body().unwrap();
    let fields = api.types.object_fields(form.ty).unwrap();
    let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["caption", "photo"]);

    let login = api.operation("login").unwrap();
    let content = login.content_type.as_ref().unwrap();
    assert_eq!(content.kind, ContentKind::FormUrlEncoded);
    assert_eq!(content.media_type, "application/x-www-form-urlencoded");
    assert!(login.body().unwrap().required);

    let response = list.response_for(200).unwrap();
    assert_eq!(response.content[0].media_type, "application/json");
}

#[test]
fn test_derived_names_without_operation_ids() {
    let raw = r#"{
        "openapi": "3.0.0",
        "info": {"title": "Derived", "version": "1"},
        "paths": {
            "/movies/{id}": {"get": {"responses": {}}, "delete": {"responses": {}}},
            "/users/login": {"post": {"responses": {}}},
            "/movies": {"post": {"responses": {}}}
        }
    }"#;
    let api = normalize(raw, None).unwrap();
    let ids: Vec<&str> = api.operations.iter().map(|op| op.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["createMovies", "getMoviesId", "deleteMoviesId", "loginUsers"]
    );
}

#[test]
fn test_unresolved_reference() {
    let raw = r##"{
        "openapi": "3.0.0",
        "info": {"title": "Broken", "version": "1"},
        "paths": {
            "/movies": {"get": {"responses": {"200": {
                "description": "ok",
                "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Missing"}}}
            }}}}
        }
    }"##;
    let result = normalize(raw, None);
    assert!(matches!(
        result,
        Err(GeneratorError::Schema(SchemaError::UnresolvedReference(r))) if r.ends_with("Missing")
    ));
}

#[test]
fn test_unsupported_and_malformed_documents() {
    assert!(matches!(
        normalize(r#"{"openapi": "4.0.0", "paths": {}}"#, None),
        Err(GeneratorError::Schema(SchemaError::UnsupportedVersion(_)))
    ));
    assert!(matches!(
        normalize("{{{", None),
        Err(GeneratorError::Schema(SchemaError::ParseFailure(_)))
    ));
    assert!(matches!(
        normalize(r#"{"paths": {}}"#, None),
        Err(GeneratorError::Schema(SchemaError::AmbiguousKind))
    ));
}

#[test]
fn test_name_collision_is_an_error() {
    let raw = r#"{
        "openapi": "3.0.0",
        "info": {"title": "Collide", "version": "1"},
        "paths": {
            "/movies/{id}": {"put": {"responses": {}}, "patch": {"responses": {}}}
        }
    }"#;
    assert!(matches!(
        normalize(raw, None),
        Err(GeneratorError::Name(_))
    ));
}

#[test]
fn test_normalize_yaml_file_with_kind_override() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("health.yaml");
    std::fs::write(
        &path,
        "openapi: 3.0.0\ninfo:\n  title: Health\n  version: '2'\npaths:\n  /health:\n    get:\n      responses:\n        '200':\n          description: ok\n",
    )
    .unwrap();

    let api = normalize_file(&path, Some(SchemaKind::OpenApi)).unwrap();
    assert_eq!(api.title, "Health");
    assert_eq!(api.version, "2");
    assert_eq!(api.operations[0].id, "getHealth");

    let error = normalize_file(dir.path().join("missing.yaml"), None).unwrap_err();
    assert!(matches!(error, GeneratorError::Generation(message) if message.contains("missing.yaml")));
}
