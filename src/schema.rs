//! Schema tree types
//!
//! The intermediate representation handed over by the YANG parser. Nodes live
//! in an arena and refer to each other by [`NodeId`]; children are kept in a
//! hash map so nothing downstream can depend on declaration order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ProtogenError, Result};

/// Index of a node inside its [`SchemaTree`]
pub type NodeId = usize;

/// Kind of schema node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Module,
    Container,
    List,
    Leaf,
    LeafList,
    /// anydata/anyxml; carried through the tree but has no protobuf mapping
    Anydata,
}

impl NodeKind {
    /// Containers and lists become messages
    pub fn is_directory(&self) -> bool {
        matches!(self, NodeKind::Container | NodeKind::List)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, NodeKind::Leaf | NodeKind::LeafList)
    }
}

/// Member of a YANG enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    /// Declared (or implicitly assigned) ordinal
    pub value: i64,
}

/// Identity base referenced by an identityref
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityBase {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Names of every identity derived from this base
    #[serde(default)]
    pub values: Vec<String>,
}

/// Resolved kind of a leaf type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TypeKind {
    String,
    Boolean,
    Empty,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Decimal64,
    Binary,
    Bits,
    InstanceIdentifier,
    Leafref,
    Enumeration { members: Vec<EnumMember> },
    Identityref { base: IdentityBase },
    Union { members: Vec<TypeDescriptor> },
}

/// Type of a leaf or leaf-list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// YANG type name: the builtin name (`enumeration`, `string`, ...) or
    /// the typedef name when the type is a typedef reference
    pub name: String,
    #[serde(flatten)]
    pub kind: TypeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    /// Builtin scalar named after its kind (`string`, `uint32`, ...)
    pub fn builtin(kind: TypeKind) -> Self {
        let name = builtin_name(&kind);
        Self::new(name, kind)
    }

    pub fn string() -> Self {
        Self::builtin(TypeKind::String)
    }

    pub fn boolean() -> Self {
        Self::builtin(TypeKind::Boolean)
    }

    /// Inline `enumeration` literal
    pub fn enumeration(members: &[(&str, i64)]) -> Self {
        Self::new("enumeration", TypeKind::Enumeration { members: members_of(members) })
    }

    /// Enumeration declared through a named typedef
    pub fn typedef_enum(typedef: impl Into<String>, members: &[(&str, i64)]) -> Self {
        Self::new(typedef, TypeKind::Enumeration { members: members_of(members) })
    }

    pub fn identityref(base: impl Into<String>, values: &[&str]) -> Self {
        Self::new(
            "identityref",
            TypeKind::Identityref {
                base: IdentityBase {
                    name: base.into(),
                    module: None,
                    values: values.iter().map(|v| v.to_string()).collect(),
                },
            },
        )
    }

    pub fn union(members: Vec<TypeDescriptor>) -> Self {
        Self::new("union", TypeKind::Union { members })
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// An inline enumeration literal, as opposed to a typedef'd one
    pub fn is_inline_enum(&self) -> bool {
        matches!(self.kind, TypeKind::Enumeration { .. }) && self.name == "enumeration"
    }

    /// Whether this type (or any union member) resolves to an enumerated type
    pub fn contains_enum(&self) -> bool {
        match &self.kind {
            TypeKind::Enumeration { .. } | TypeKind::Identityref { .. } => true,
            TypeKind::Union { members } => members.iter().any(|m| m.contains_enum()),
            _ => false,
        }
    }
}

fn members_of(members: &[(&str, i64)]) -> Vec<EnumMember> {
    members
        .iter()
        .map(|(name, value)| EnumMember {
            name: name.to_string(),
            value: *value,
        })
        .collect()
}

fn builtin_name(kind: &TypeKind) -> &'static str {
    match kind {
        TypeKind::String => "string",
        TypeKind::Boolean => "boolean",
        TypeKind::Empty => "empty",
        TypeKind::Int8 => "int8",
        TypeKind::Int16 => "int16",
        TypeKind::Int32 => "int32",
        TypeKind::Int64 => "int64",
        TypeKind::Uint8 => "uint8",
        TypeKind::Uint16 => "uint16",
        TypeKind::Uint32 => "uint32",
        TypeKind::Uint64 => "uint64",
        TypeKind::Decimal64 => "decimal64",
        TypeKind::Binary => "binary",
        TypeKind::Bits => "bits",
        TypeKind::InstanceIdentifier => "instance-identifier",
        TypeKind::Leafref => "leafref",
        TypeKind::Enumeration { .. } => "enumeration",
        TypeKind::Identityref { .. } => "identityref",
        TypeKind::Union { .. } => "union",
    }
}

/// One node of the schema tree
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub name: String,
    pub kind: NodeKind,
    /// Names from the module down to (and including) this node
    pub path: Vec<String>,
    pub parent: Option<NodeId>,
    pub children: HashMap<String, NodeId>,
    /// Key leaf names in declaration order; empty for unkeyed lists
    pub key: Vec<String>,
    pub leaf_type: Option<TypeDescriptor>,
}

impl SchemaNode {
    /// Absolute schema path, e.g. `/openconfig-interfaces/interfaces/interface`
    pub fn path_string(&self) -> String {
        format!("/{}", self.path.join("/"))
    }

    pub fn is_keyed_list(&self) -> bool {
        self.kind == NodeKind::List && !self.key.is_empty()
    }
}

/// Serialized form of a schema node, as produced by the parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
    pub name: String,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key: Vec<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub leaf_type: Option<TypeDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeDef>,
}

impl NodeDef {
    fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            key: Vec::new(),
            leaf_type: None,
            children: Vec::new(),
        }
    }

    pub fn module(name: impl Into<String>, children: Vec<NodeDef>) -> Self {
        Self {
            children,
            ..Self::new(name, NodeKind::Module)
        }
    }

    pub fn container(name: impl Into<String>, children: Vec<NodeDef>) -> Self {
        Self {
            children,
            ..Self::new(name, NodeKind::Container)
        }
    }

    pub fn list(name: impl Into<String>, key: &[&str], children: Vec<NodeDef>) -> Self {
        Self {
            key: key.iter().map(|k| k.to_string()).collect(),
            children,
            ..Self::new(name, NodeKind::List)
        }
    }

    pub fn leaf(name: impl Into<String>, leaf_type: TypeDescriptor) -> Self {
        Self {
            leaf_type: Some(leaf_type),
            ..Self::new(name, NodeKind::Leaf)
        }
    }

    pub fn leaf_list(name: impl Into<String>, leaf_type: TypeDescriptor) -> Self {
        Self {
            leaf_type: Some(leaf_type),
            ..Self::new(name, NodeKind::LeafList)
        }
    }

    pub fn anydata(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Anydata)
    }
}

/// Immutable schema tree rooted at a module
#[derive(Debug, Clone)]
pub struct SchemaTree {
    nodes: Vec<SchemaNode>,
}

impl SchemaTree {
    /// Build the arena from a nested definition.
    ///
    /// Only structural problems that would make the arena ambiguous are
    /// rejected here; semantic validation is the parser's job.
    pub fn from_def(def: NodeDef) -> Result<Self> {
        if def.kind != NodeKind::Module {
            return Err(ProtogenError::InvalidSchema(format!(
                "root {} must be a module, got {:?}",
                def.name, def.kind
            )));
        }

        let mut tree = Self { nodes: Vec::new() };
        tree.insert(def, None)?;
        Ok(tree)
    }

    /// Parse the JSON form of a module
    pub fn from_json(json: &str) -> Result<Self> {
        let def: NodeDef = serde_json::from_str(json)?;
        Self::from_def(def)
    }

    fn insert(&mut self, def: NodeDef, parent: Option<NodeId>) -> Result<NodeId> {
        let id = self.nodes.len();
        let mut path = parent
            .map(|p| self.nodes[p].path.clone())
            .unwrap_or_default();
        path.push(def.name.clone());

        if def.kind.is_leaf() && def.leaf_type.is_none() {
            return Err(ProtogenError::InvalidSchema(format!(
                "leaf /{} has no type",
                path.join("/")
            )));
        }

        self.nodes.push(SchemaNode {
            name: def.name,
            kind: def.kind,
            path,
            parent,
            children: HashMap::new(),
            key: def.key,
            leaf_type: def.leaf_type,
        });

        for child in def.children {
            let child_name = child.name.clone();
            let child_id = self.insert(child, Some(id))?;
            if self.nodes[id].children.insert(child_name.clone(), child_id).is_some() {
                return Err(ProtogenError::InvalidSchema(format!(
                    "duplicate child {} under {}",
                    child_name,
                    self.nodes[id].path_string()
                )));
            }
        }

        Ok(id)
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn module_name(&self) -> &str {
        &self.nodes[0].name
    }

    /// Look a node up by its absolute path string
    pub fn find(&self, path: &str) -> Option<NodeId> {
        let mut current = self.root();
        let mut parts = path.trim_start_matches('/').split('/');
        if parts.next()? != self.module_name() {
            return None;
        }
        for part in parts {
            current = *self.nodes[current].children.get(part)?;
        }
        Some(current)
    }

    /// Children of `id` in lexicographic name order
    pub fn sorted_children(&self, id: NodeId) -> Vec<(&str, NodeId)> {
        let mut children: Vec<(&str, NodeId)> = self.nodes[id]
            .children
            .iter()
            .map(|(name, child)| (name.as_str(), *child))
            .collect();
        children.sort_by(|a, b| a.0.cmp(b.0));
        children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NodeDef {
        NodeDef::module(
            "m",
            vec![NodeDef::container(
                "interfaces",
                vec![NodeDef::list(
                    "interface",
                    &["name"],
                    vec![
                        NodeDef::leaf("name", TypeDescriptor::string()),
                        NodeDef::leaf("mtu", TypeDescriptor::builtin(TypeKind::Uint16)),
                    ],
                )],
            )],
        )
    }

    #[test]
    fn test_paths_and_parents() {
        let tree = SchemaTree::from_def(sample()).unwrap();
        let mtu = tree.find("/m/interfaces/interface/mtu").unwrap();
        let node = tree.node(mtu);
        assert_eq!(node.path_string(), "/m/interfaces/interface/mtu");

        let list = tree.node(node.parent.unwrap());
        assert!(list.is_keyed_list());
        assert_eq!(list.key, vec!["name"]);
    }

    #[test]
    fn test_duplicate_child_rejected() {
        let def = NodeDef::module(
            "m",
            vec![
                NodeDef::leaf("a", TypeDescriptor::string()),
                NodeDef::leaf("a", TypeDescriptor::boolean()),
            ],
        );
        assert!(matches!(
            SchemaTree::from_def(def),
            Err(ProtogenError::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_json_round_trip_of_type_descriptor() {
        let json = r#"{
            "name": "m",
            "kind": "module",
            "children": [
                {"name": "oper", "kind": "leaf",
                 "type": {"name": "enumeration", "kind": "enumeration",
                          "members": [{"name": "UP", "value": 0}, {"name": "DOWN", "value": 1}],
                          "default": "UP"}}
            ]
        }"#;
        let tree = SchemaTree::from_json(json).unwrap();
        let oper = tree.node(tree.find("/m/oper").unwrap());
        let ty = oper.leaf_type.as_ref().unwrap();
        assert!(ty.is_inline_enum());
        assert_eq!(ty.default.as_deref(), Some("UP"));
    }

    #[test]
    fn test_sorted_children_ignores_declaration_order() {
        let def = NodeDef::module(
            "m",
            vec![
                NodeDef::leaf("b", TypeDescriptor::string()),
                NodeDef::leaf("a", TypeDescriptor::string()),
                NodeDef::leaf("c", TypeDescriptor::string()),
            ],
        );
        let tree = SchemaTree::from_def(def).unwrap();
        let names: Vec<&str> = tree.sorted_children(tree.root()).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
