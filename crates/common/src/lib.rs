//! Common types and utilities for clientgen
//!
//! This crate contains the operation IR produced by the schema normalizers,
//! the type graph shared by the emitter and the runtime validator, generation
//! options, and the error types used across the workspace.

pub mod config;
pub mod ir;
pub mod naming;
pub mod options;
pub mod types;

pub use config::GenerationConfig;
pub use ir::{
    is_json_media_type, ApiDefinition, ContentKind, GraphqlRoots, HttpMethod, MediaSpec, Operation,
    ParamLocation, Parameter, RequestContent, ResponseSpec, Route, SchemaKind, StatusKey,
};
pub use options::{EmitOptions, Flavor, ModuleFormat, UnionStyle};
pub use types::{structurally_equivalent, Field, Primitive, TypeGraph, TypeId, TypeKind, TypeNode};

use thiserror::Error;

/// Errors raised while reading and normalizing a schema document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Failed to parse schema: {0}")]
    ParseFailure(String),

    #[error("Unsupported schema version: {0}")]
    UnsupportedVersion(String),

    #[error("Cannot tell whether the document is an OpenAPI or a GraphQL schema")]
    AmbiguousKind,

    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),
}

/// Errors raised while assigning operation identifiers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("Operation names collide and cannot be disambiguated: {}", names.join(", "))]
    Unresolvable { names: Vec<String> },
}

/// Errors that can occur during client generation
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Name(#[from] NameError),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, GeneratorError>;
