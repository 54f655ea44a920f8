//! GraphQL introspection result structures
//!
//! Mirrors the shape returned by the standard introspection query
//! (`__schema { queryType { name } types { ... } }`).

use serde::{Deserialize, Serialize};

/// The `__schema` object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionSchema {
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub query_type: Option<NamedTypeRef>,

    #[serde(default)]
    pub mutation_type: Option<NamedTypeRef>,

    #[serde(default)]
    pub subscription_type: Option<NamedTypeRef>,

    #[serde(default)]
    pub types: Vec<FullType>,
}

impl IntrospectionSchema {
    pub fn find_type(&self, name: &str) -> Option<&FullType> {
        self.types
            .iter()
            .find(|t| t.name.as_deref() == Some(name))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedTypeRef {
    pub name: String,
}

/// `__TypeKind`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntrospectionKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

/// A named type declared by the schema
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullType {
    pub kind: IntrospectionKind,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub fields: Option<Vec<FieldDef>>,

    #[serde(default)]
    pub input_fields: Option<Vec<InputValue>>,

    #[serde(default)]
    pub interfaces: Option<Vec<TypeRef>>,

    #[serde(default)]
    pub enum_values: Option<Vec<EnumValue>>,

    #[serde(default)]
    pub possible_types: Option<Vec<TypeRef>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub args: Vec<InputValue>,

    #[serde(rename = "type")]
    pub ty: TypeRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputValue {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(rename = "type")]
    pub ty: TypeRef,

    #[serde(default)]
    pub default_value: Option<String>,
}

/// Reference to a type, possibly wrapped in `LIST` / `NON_NULL`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRef {
    pub kind: IntrospectionKind,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub of_type: Option<Box<TypeRef>>,
}

impl TypeRef {
    /// Name of the innermost named type
    pub fn named(&self) -> Option<&str> {
        match &self.of_type {
            Some(inner) if self.name.is_none() => inner.named(),
            _ => self.name.as_deref(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        self.kind == IntrospectionKind::NonNull
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,
}
