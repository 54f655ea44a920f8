//! Type graph shared by the normalizers, the emitter and the runtime validator
//!
//! Types live in an arena. Named types (schema components, GraphQL object
//! types) are materialized once and every reference to them is an index
//! edge, so recursive schemas form cycles in the graph instead of infinitely
//! deep trees. Anonymous nodes are never part of a cycle.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Index of a node in a [`TypeGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(usize);

impl TypeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Scalar kinds understood by the emitter and the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    String,
    Number,
    Boolean,
    Null,
}

impl Primitive {
    pub fn as_str(self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::Number => "number",
            Primitive::Boolean => "boolean",
            Primitive::Null => "null",
        }
    }
}

/// A field of an object type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: TypeId,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: TypeId, required: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            required,
            description: None,
        }
    }
}

/// Shape of a type node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// No type information (e.g. an empty schema)
    Unknown,
    Primitive(Primitive),
    /// Ordered field list
    Object(Vec<Field>),
    /// String-keyed map with a uniform value type
    Map(TypeId),
    Array(TypeId),
    /// Closed set of JSON literal values
    Enum(Vec<serde_json::Value>),
    Union(Vec<TypeId>),
}

/// A node of the graph, optionally named
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub kind: TypeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Arena of type nodes with a name index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeGraph {
    nodes: Vec<TypeNode>,
    names: BTreeMap<String, TypeId>,
}

impl TypeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an anonymous node
    pub fn add(&mut self, kind: TypeKind) -> TypeId {
        let id = TypeId(self.nodes.len());
        self.nodes.push(TypeNode {
            name: None,
            kind,
            description: None,
        });
        id
    }

    pub fn primitive(&mut self, primitive: Primitive) -> TypeId {
        self.add(TypeKind::Primitive(primitive))
    }

    pub fn unknown(&mut self) -> TypeId {
        self.add(TypeKind::Unknown)
    }

    /// Reserve a named node whose shape is filled in later with [`set_kind`].
    ///
    /// Reserving before mapping the body is what lets self-referencing types
    /// resolve to their own id. Returns the existing id if the name is taken.
    ///
    /// [`set_kind`]: TypeGraph::set_kind
    pub fn reserve_named(&mut self, name: impl Into<String>) -> TypeId {
        let name = name.into();
        if let Some(id) = self.names.get(&name) {
            return *id;
        }
        let id = TypeId(self.nodes.len());
        self.nodes.push(TypeNode {
            name: Some(name.clone()),
            kind: TypeKind::Unknown,
            description: None,
        });
        self.names.insert(name, id);
        id
    }

    pub fn set_kind(&mut self, id: TypeId, kind: TypeKind) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.kind = kind;
        }
    }

    pub fn set_description(&mut self, id: TypeId, description: Option<String>) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.description = description;
        }
    }

    /// Pick a name derived from `candidate` that is not yet used in the graph
    pub fn unique_name(&self, candidate: &str) -> String {
        if !self.names.contains_key(candidate) {
            return candidate.to_string();
        }
        let mut n = 2;
        loop {
            let name = format!("{}{}", candidate, n);
            if !self.names.contains_key(&name) {
                return name;
            }
            n += 1;
        }
    }

    pub fn node(&self, id: TypeId) -> &TypeNode {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.nodes[id.0].kind
    }

    pub fn name_of(&self, id: TypeId) -> Option<&str> {
        self.nodes[id.0].name.as_deref()
    }

    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.names.get(name).copied()
    }

    /// Named nodes in name order
    pub fn named(&self) -> impl Iterator<Item = (&str, TypeId)> {
        self.names.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Follow single-member unions (aliases) to the node they name
    pub fn resolve(&self, id: TypeId) -> TypeId {
        let mut id = id;
        for _ in 0..self.nodes.len() {
            match self.kind(id) {
                TypeKind::Union(members) if members.len() == 1 => id = members[0],
                _ => break,
            }
        }
        id
    }

    /// Object fields of a node, looking through aliases
    pub fn object_fields(&self, id: TypeId) -> Option<&[Field]> {
        match self.kind(self.resolve(id)) {
            TypeKind::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Short human readable description used in error messages
    pub fn describe(&self, id: TypeId) -> String {
        let node = self.node(id);
        if let Some(name) = &node.name {
            return name.clone();
        }
        match &node.kind {
            TypeKind::Unknown => "unknown".to_string(),
            TypeKind::Primitive(p) => p.as_str().to_string(),
            TypeKind::Object(_) => "object".to_string(),
            TypeKind::Map(value) => format!("map<{}>", self.describe(*value)),
            TypeKind::Array(item) => format!("{}[]", self.describe(*item)),
            TypeKind::Enum(values) => values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" | "),
            TypeKind::Union(members) => members
                .iter()
                .map(|m| self.describe(*m))
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }

    /// Whether every named type of `self` exists in `other` with the same structure
    pub fn equivalent_to(&self, other: &TypeGraph) -> bool {
        self.named().all(|(name, id)| match other.lookup(name) {
            Some(other_id) => structurally_equivalent(self, id, other, other_id),
            None => false,
        })
    }
}

/// Compare two nodes, possibly from different graphs, structurally.
///
/// Named nodes must carry the same name. Pairs of named nodes already under
/// comparison are assumed equal, which terminates on cycles.
pub fn structurally_equivalent(a: &TypeGraph, a_id: TypeId, b: &TypeGraph, b_id: TypeId) -> bool {
    let mut assumed = HashSet::new();
    equivalent(a, a_id, b, b_id, &mut assumed)
}

fn equivalent(
    a: &TypeGraph,
    a_id: TypeId,
    b: &TypeGraph,
    b_id: TypeId,
    assumed: &mut HashSet<(TypeId, TypeId)>,
) -> bool {
    let (left, right) = (a.node(a_id), b.node(b_id));
    if left.name != right.name {
        return false;
    }
    if left.name.is_some() && !assumed.insert((a_id, b_id)) {
        return true;
    }

    match (&left.kind, &right.kind) {
        (TypeKind::Unknown, TypeKind::Unknown) => true,
        (TypeKind::Primitive(x), TypeKind::Primitive(y)) => x == y,
        (TypeKind::Object(x), TypeKind::Object(y)) => {
            x.len() == y.len()
                && x.iter().zip(y).all(|(fx, fy)| {
                    fx.name == fy.name
                        && fx.required == fy.required
                        && equivalent(a, fx.ty, b, fy.ty, assumed)
                })
        }
        (TypeKind::Map(x), TypeKind::Map(y)) | (TypeKind::Array(x), TypeKind::Array(y)) => {
            equivalent(a, *x, b, *y, assumed)
        }
        (TypeKind::Enum(x), TypeKind::Enum(y)) => x == y,
        (TypeKind::Union(x), TypeKind::Union(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .zip(y)
                    .all(|(mx, my)| equivalent(a, *mx, b, *my, assumed))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linked_list(graph: &mut TypeGraph) -> TypeId {
        let node = graph.reserve_named("Node");
        let value = graph.primitive(Primitive::String);
        let next = graph.add(TypeKind::Union(vec![node, value]));
        graph.set_kind(
            node,
            TypeKind::Object(vec![
                Field::new("value", value, true),
                Field::new("next", next, false),
            ]),
        );
        node
    }

    #[test]
    fn test_reserve_named_is_idempotent() {
        let mut graph = TypeGraph::new();
        let a = graph.reserve_named("Movie");
        let b = graph.reserve_named("Movie");
        assert_eq!(a, b);
        assert_eq!(graph.lookup("Movie"), Some(a));
        assert_eq!(graph.name_of(a), Some("Movie"));
    }

    #[test]
    fn test_unique_name() {
        let mut graph = TypeGraph::new();
        graph.reserve_named("Movie");
        graph.reserve_named("Movie2");
        assert_eq!(graph.unique_name("Movie"), "Movie3");
        assert_eq!(graph.unique_name("Quote"), "Quote");
    }

    #[test]
    fn test_cyclic_graphs_are_equivalent() {
        let mut a = TypeGraph::new();
        let mut b = TypeGraph::new();
        let ia = linked_list(&mut a);
        let ib = linked_list(&mut b);
        assert!(structurally_equivalent(&a, ia, &b, ib));
        assert!(a.equivalent_to(&b));
    }

    #[test]
    fn test_required_flag_breaks_equivalence() {
        let mut a = TypeGraph::new();
        let mut b = TypeGraph::new();
        let sa = a.primitive(Primitive::String);
        let sb = b.primitive(Primitive::String);
        let oa = a.reserve_named("Movie");
        let ob = b.reserve_named("Movie");
        a.set_kind(oa, TypeKind::Object(vec![Field::new("title", sa, true)]));
        b.set_kind(ob, TypeKind::Object(vec![Field::new("title", sb, false)]));
        assert!(!a.equivalent_to(&b));
    }

    #[test]
    fn test_describe() {
        let mut graph = TypeGraph::new();
        let movie = graph.reserve_named("Movie");
        let list = graph.add(TypeKind::Array(movie));
        let null = graph.primitive(Primitive::Null);
        let maybe = graph.add(TypeKind::Union(vec![list, null]));
        assert_eq!(graph.describe(maybe), "Movie[] | null");
    }
}
