//! Schema types and structures
//!
//! An XForm schema is held as an immutable tree of [`SchemaNode`]s. Nodes
//! live in an arena owned by the [`SchemaTree`] and refer to their children
//! by [`NodeId`]; a path index gives O(1) lookup during diffing. Trees are
//! read-only once built and safe to share across threads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::version::FormVersion;

/// Separator used when qualifying node paths
pub const PATH_SEPARATOR: char = '/';

/// A named simple type: an enumeration or multiselect list definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleType {
    /// Type name, unique within a schema
    pub name: String,
    /// Values allowed by the enumeration restriction
    pub allowed_values: Vec<String>,
    /// Values allowed per item when the type is a multiselect list
    pub multiselect_values: Vec<String>,
}

impl SimpleType {
    /// Create an empty named type
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allowed_values: Vec::new(),
            multiselect_values: Vec::new(),
        }
    }

    /// Whether this type is a multiselect list
    pub fn is_multiselect(&self) -> bool {
        !self.multiselect_values.is_empty()
    }
}

/// The scalar type carried by a leaf node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    /// A built-in XSD type, e.g. "xs:string"
    Builtin(String),
    /// A named enumeration or list type, resolved at parse time.
    /// The allowed value set is part of the type's identity.
    Enumerated(SimpleType),
    /// The element declared no type
    Untyped,
}

/// What a schema node is: a grouping of children, or a value-bearing leaf
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Grouping node with nested children
    Group,
    /// Leaf node carrying a scalar value
    Scalar(ScalarKind),
}

/// Handle to a node within its owning [`SchemaTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

/// One structural unit of a form schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaNode {
    /// Unqualified element name, unique among siblings
    pub name: String,
    /// Slash-qualified path from the root, unique within the tree
    pub path: String,
    /// Group or scalar, with the scalar type when relevant
    pub kind: NodeKind,
    /// Whether instances of this node may occur more than once
    pub repeatable: bool,
    /// Ordered children (empty for leaves)
    pub children: Vec<NodeId>,
}

impl SchemaNode {
    /// The unqualified tag of the element (last path segment)
    pub fn short_name(&self) -> &str {
        self.path
            .rsplit(PATH_SEPARATOR)
            .next()
            .unwrap_or(&self.path)
    }

    /// Whether this node groups nested children
    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group)
    }
}

/// An immutable, parsed form schema
#[derive(Debug, Clone)]
pub struct SchemaTree {
    target_namespace: Option<String>,
    version: FormVersion,
    uiversion: FormVersion,
    root: NodeId,
    nodes: Vec<SchemaNode>,
    types: BTreeMap<String, SimpleType>,
    by_path: BTreeMap<String, NodeId>,
}

impl SchemaTree {
    /// The schema's target namespace, if declared
    pub fn target_namespace(&self) -> Option<&str> {
        self.target_namespace.as_deref()
    }

    /// The declared form version
    pub fn version(&self) -> &FormVersion {
        &self.version
    }

    /// The declared UI version
    pub fn uiversion(&self) -> &FormVersion {
        &self.uiversion
    }

    /// The root node of the form
    pub fn root(&self) -> &SchemaNode {
        &self.nodes[self.root.0]
    }

    /// Resolve a node handle
    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    /// Look up a node by its qualified path
    pub fn get(&self, path: &str) -> Option<&SchemaNode> {
        self.by_path.get(path).map(|&id| &self.nodes[id.0])
    }

    /// All node paths in the tree, in sorted order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.by_path.keys().map(String::as_str)
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no nodes (never true for a parsed schema)
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Named simple types defined by the schema
    pub fn types(&self) -> &BTreeMap<String, SimpleType> {
        &self.types
    }

    /// Look up a named simple type
    pub fn named_type(&self, name: &str) -> Option<&SimpleType> {
        self.types.get(name)
    }

    /// The meta block, if the form has one.
    ///
    /// Meta is a top-level child of the root named "meta" (case-insensitive).
    pub fn meta_element(&self) -> Option<&SchemaNode> {
        self.root()
            .children
            .iter()
            .map(|&id| self.node(id))
            .find(|child| child.short_name().eq_ignore_ascii_case("meta"))
    }

    /// Dump the entire schema to an indented string, types first
    pub fn dump(&self) -> String {
        let mut out = String::new();
        if let Some(ns) = &self.target_namespace {
            out.push_str(&format!("DEFINITION OF {}\n", ns));
        }
        if !self.types.is_empty() {
            out.push_str("TYPES:\n");
            for ty in self.types.values() {
                out.push_str(&format!("  {}\n", ty.name));
                for value in &ty.allowed_values {
                    out.push_str(&format!("    allowed_value: {}\n", value));
                }
                for value in &ty.multiselect_values {
                    out.push_str(&format!("    multiselect_value: {}\n", value));
                }
            }
        }
        out.push_str("ELEMENTS:\n");
        self.dump_node(self.root, 1, &mut out);
        out
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = self.node(id);
        let indent = "  ".repeat(depth);
        let kind = match &node.kind {
            NodeKind::Group => "group".to_string(),
            NodeKind::Scalar(ScalarKind::Builtin(ty)) => ty.clone(),
            NodeKind::Scalar(ScalarKind::Enumerated(ty)) => format!("enum {}", ty.name),
            NodeKind::Scalar(ScalarKind::Untyped) => "untyped".to_string(),
        };
        out.push_str(&format!(
            "{}{} type={} repeatable={}\n",
            indent, node.path, kind, node.repeatable
        ));
        for &child in &node.children {
            self.dump_node(child, depth + 1, out);
        }
    }
}

impl fmt::Display for SchemaTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.target_namespace.as_deref().unwrap_or(""))
    }
}

/// Incremental builder used by the parser; sealed into an immutable tree
#[derive(Debug, Default)]
pub(crate) struct SchemaTreeBuilder {
    nodes: Vec<SchemaNode>,
    types: BTreeMap<String, SimpleType>,
    by_path: BTreeMap<String, NodeId>,
}

impl SchemaTreeBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a node under `parent` (or as a top-level node) and index its path
    pub(crate) fn add_node(
        &mut self,
        parent: Option<NodeId>,
        name: &str,
        kind: NodeKind,
        repeatable: bool,
    ) -> NodeId {
        let path = match parent {
            Some(pid) => format!("{}{}{}", self.nodes[pid.0].path, PATH_SEPARATOR, name),
            None => name.to_string(),
        };
        let id = NodeId(self.nodes.len());
        self.nodes.push(SchemaNode {
            name: name.to_string(),
            path: path.clone(),
            kind,
            repeatable,
            children: Vec::new(),
        });
        if let Some(pid) = parent {
            self.nodes[pid.0].children.push(id);
        }
        // Well-formed schemas do not declare duplicate siblings; if one
        // does, the first occurrence wins for path lookup.
        if self.by_path.contains_key(&path) {
            tracing::warn!(path = %path, "duplicate node path in schema");
        } else {
            self.by_path.insert(path, id);
        }
        id
    }

    /// Replace a node's kind once its children are known
    pub(crate) fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        self.nodes[id.0].kind = kind;
    }

    pub(crate) fn has_children(&self, id: NodeId) -> bool {
        !self.nodes[id.0].children.is_empty()
    }

    pub(crate) fn path_of(&self, id: NodeId) -> &str {
        &self.nodes[id.0].path
    }

    pub(crate) fn define_type(&mut self, ty: SimpleType) {
        self.types.insert(ty.name.clone(), ty);
    }

    pub(crate) fn named_type(&self, name: &str) -> Option<&SimpleType> {
        self.types.get(name)
    }

    pub(crate) fn finish(
        self,
        target_namespace: Option<String>,
        version: FormVersion,
        uiversion: FormVersion,
        root: NodeId,
    ) -> SchemaTree {
        SchemaTree {
            target_namespace,
            version,
            uiversion,
            root,
            nodes: self.nodes,
            types: self.types,
            by_path: self.by_path,
        }
    }
}
