//! Type mapping from OpenAPI schemas to the type graph
//!
//! Component schemas become named nodes. A named node is reserved before its
//! body is mapped, so a schema that refers to itself (directly or through
//! other components) resolves to the reserved id instead of recursing.

use crate::openapi::{ref_name, AdditionalProperties, Schema, SCHEMA_REF_PREFIXES};
use clientgen_common::naming::type_name;
use clientgen_common::{Field, Primitive, SchemaError, TypeGraph, TypeId, TypeKind};
use std::collections::{BTreeMap, HashMap};

/// Maps schemas into a [`TypeGraph`]
pub struct TypeMapper<'a> {
    schemas: &'a BTreeMap<String, Schema>,
    graph: TypeGraph,
    /// Component name as written in the document → node
    named: HashMap<String, TypeId>,
}

impl<'a> TypeMapper<'a> {
    pub fn new(schemas: &'a BTreeMap<String, Schema>) -> Self {
        Self {
            schemas,
            graph: TypeGraph::new(),
            named: HashMap::new(),
        }
    }

    /// Map every component, including ones no operation refers to
    pub fn map_components(&mut self) -> Result<(), SchemaError> {
        let schemas = self.schemas;
        for name in schemas.keys() {
            self.map_named(name)?;
        }
        Ok(())
    }

    pub fn graph(&self) -> &TypeGraph {
        &self.graph
    }

    pub fn into_graph(self) -> TypeGraph {
        self.graph
    }

    /// Map a schema to a node
    ///
    /// # Examples
    /// ```
    /// use clientgen_parser::openapi::Schema;
    /// use clientgen_parser::TypeMapper;
    /// use clientgen_common::{Primitive, TypeKind};
    /// use std::collections::BTreeMap;
    ///
    /// let schemas = BTreeMap::new();
    /// let mut mapper = TypeMapper::new(&schemas);
    /// let schema: Schema = serde_json::from_str(r#"{"type": "integer"}"#).unwrap();
    /// let id = mapper.map_schema(&schema).unwrap();
    /// assert_eq!(mapper.graph().kind(id), &TypeKind::Primitive(Primitive::Number));
    /// ```
    pub fn map_schema(&mut self, schema: &Schema) -> Result<TypeId, SchemaError> {
        if let Some(ref_path) = &schema.ref_path {
            let target = self.map_ref(ref_path)?;
            return Ok(self.wrap_nullable(schema, target));
        }
        let kind = self.kind_of(schema)?;
        let id = self.graph.add(kind);
        self.graph.set_description(id, schema.description.clone());
        Ok(self.wrap_nullable(schema, id))
    }

    fn map_ref(&mut self, ref_path: &str) -> Result<TypeId, SchemaError> {
        let name = ref_name(ref_path, SCHEMA_REF_PREFIXES)
            .ok_or_else(|| SchemaError::UnresolvedReference(ref_path.to_string()))?;
        if !self.schemas.contains_key(&name) {
            return Err(SchemaError::UnresolvedReference(ref_path.to_string()));
        }
        self.map_named(&name)
    }

    fn map_named(&mut self, raw: &str) -> Result<TypeId, SchemaError> {
        if let Some(id) = self.named.get(raw) {
            return Ok(*id);
        }
        let schemas = self.schemas;
        let schema = schemas
            .get(raw)
            .ok_or_else(|| SchemaError::UnresolvedReference(raw.to_string()))?;

        let name = self.graph.unique_name(&type_name(raw));
        let id = self.graph.reserve_named(name);
        self.named.insert(raw.to_string(), id);

        let kind = self.kind_of(schema)?;
        let kind = if is_nullable(schema) {
            let inner = self.graph.add(kind);
            let null = self.graph.primitive(Primitive::Null);
            TypeKind::Union(vec![inner, null])
        } else {
            kind
        };
        self.graph.set_kind(id, kind);
        self.graph.set_description(id, schema.description.clone());
        Ok(id)
    }

    fn wrap_nullable(&mut self, schema: &Schema, id: TypeId) -> TypeId {
        if !is_nullable(schema) || self.graph.kind(id) == &TypeKind::Primitive(Primitive::Null) {
            return id;
        }
        let null = self.graph.primitive(Primitive::Null);
        self.graph.add(TypeKind::Union(vec![id, null]))
    }

    fn kind_of(&mut self, schema: &Schema) -> Result<TypeKind, SchemaError> {
        if let Some(ref_path) = &schema.ref_path {
            // Alias of another component
            return Ok(TypeKind::Union(vec![self.map_ref(ref_path)?]));
        }
        if !schema.all_of.is_empty() {
            return self.merge_all_of(schema);
        }
        if !schema.one_of.is_empty() || !schema.any_of.is_empty() {
            let mut members = Vec::new();
            for member in schema.one_of.iter().chain(&schema.any_of) {
                members.push(self.map_schema(member)?);
            }
            return Ok(TypeKind::Union(members));
        }
        if let Some(value) = &schema.const_value {
            return Ok(TypeKind::Enum(vec![value.clone()]));
        }
        if !schema.enum_values.is_empty() {
            return Ok(TypeKind::Enum(schema.enum_values.clone()));
        }

        let names: Vec<&str> = match &schema.schema_type {
            Some(schema_type) => schema_type.names(),
            None if !schema.properties.is_empty() || schema.additional_properties.is_some() => {
                vec!["object"]
            }
            None if schema.items.is_some() => vec!["array"],
            None => vec![],
        };

        match names.as_slice() {
            [] => Ok(TypeKind::Unknown),
            [single] => self.kind_for(single, schema),
            many => {
                let mut members = Vec::new();
                for name in many {
                    let kind = self.kind_for(name, schema)?;
                    members.push(self.graph.add(kind));
                }
                Ok(TypeKind::Union(members))
            }
        }
    }

    fn kind_for(&mut self, name: &str, schema: &Schema) -> Result<TypeKind, SchemaError> {
        let kind = match name {
            "string" => TypeKind::Primitive(Primitive::String),
            "number" | "integer" => TypeKind::Primitive(Primitive::Number),
            "boolean" => TypeKind::Primitive(Primitive::Boolean),
            "null" => TypeKind::Primitive(Primitive::Null),
            "array" => {
                let item = match &schema.items {
                    Some(items) => self.map_schema(items)?,
                    None => self.graph.unknown(),
                };
                TypeKind::Array(item)
            }
            "object" => self.object_kind(schema)?,
            // Swagger 2.0 `file` and anything unrecognized
            _ => TypeKind::Unknown,
        };
        Ok(kind)
    }

    fn object_kind(&mut self, schema: &Schema) -> Result<TypeKind, SchemaError> {
        if schema.properties.is_empty() {
            match &schema.additional_properties {
                Some(AdditionalProperties::Schema(value)) => {
                    return Ok(TypeKind::Map(self.map_schema(value)?));
                }
                Some(AdditionalProperties::Allowed(true)) => {
                    return Ok(TypeKind::Map(self.graph.unknown()));
                }
                _ => {}
            }
        }

        let mut fields = Vec::with_capacity(schema.properties.len());
        for (name, property) in &schema.properties {
            let ty = self.map_schema(property)?;
            let mut field = Field::new(name.clone(), ty, schema.required.contains(name));
            field.description = property.description.clone();
            fields.push(field);
        }
        Ok(TypeKind::Object(fields))
    }

    /// Merge `allOf` members field by field.
    ///
    /// Later members override earlier ones, required flags are unioned, and
    /// the schema's own properties act as the last member.
    fn merge_all_of(&mut self, schema: &Schema) -> Result<TypeKind, SchemaError> {
        let mut members = Vec::new();
        for member in &schema.all_of {
            members.push(self.map_schema(member)?);
        }
        if !schema.properties.is_empty() {
            let own = Schema {
                all_of: vec![],
                nullable: false,
                x_nullable: false,
                ..schema.clone()
            };
            members.push(self.map_schema(&own)?);
        }

        let mut fields: Vec<Field> = Vec::new();
        let mut objects = 0;
        let mut others = Vec::new();
        for member in members {
            match self.resolve_alias(member) {
                TypeKind::Object(member_fields) => {
                    objects += 1;
                    for field in member_fields {
                        match fields.iter_mut().find(|f| f.name == field.name) {
                            Some(existing) => {
                                let required = existing.required || field.required;
                                *existing = field;
                                existing.required = required;
                            }
                            None => fields.push(field),
                        }
                    }
                }
                TypeKind::Unknown => {}
                _ => others.push(member),
            }
        }

        Ok(match (objects, others.as_slice()) {
            (0, [single]) if self.graph.name_of(*single).is_some() => {
                TypeKind::Union(vec![*single])
            }
            (0, [single]) => self.graph.kind(*single).clone(),
            (0, _) => TypeKind::Unknown,
            _ => TypeKind::Object(fields),
        })
    }

    /// Kind of a node, looking through single-member unions
    fn resolve_alias(&self, mut id: TypeId) -> TypeKind {
        for _ in 0..self.graph.len() {
            match self.graph.kind(id) {
                TypeKind::Union(members) if members.len() == 1 => id = members[0],
                kind => return kind.clone(),
            }
        }
        TypeKind::Unknown
    }
}

fn is_nullable(schema: &Schema) -> bool {
    schema.nullable || schema.x_nullable
}
