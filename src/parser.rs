//! XSD schema parsing
//!
//! Builds a [`SchemaTree`] from an XSD-like form definition document.
//! The walk mirrors the generated-schema conventions: `element` nodes become
//! schema nodes, named `simpleType` definitions become enumeration or
//! multiselect list types, and structural wrapper tags (`sequence`,
//! `complexType`) are traversed transparently without producing nodes.
//! Construction is pure; parsing never drops a node silently.

use std::fs;
use std::path::Path;

use roxmltree::{Document, Node};

use crate::error::{Result, SchemaError};
use crate::schema::{NodeId, NodeKind, ScalarKind, SchemaTree, SchemaTreeBuilder, SimpleType};
use crate::version::FormVersion;

impl SchemaTree {
    /// Parse a schema from source text
    pub fn parse(source: &str) -> Result<SchemaTree> {
        parse_str(source)
    }

    /// Parse a schema from a file on disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<SchemaTree> {
        let source = fs::read_to_string(path)?;
        parse_str(&source)
    }
}

/// Parse schema source text into an immutable tree
pub fn parse_str(source: &str) -> Result<SchemaTree> {
    let doc = Document::parse(source)?;
    let schema_root = doc.root_element();

    let target_namespace = ci_attribute(schema_root, "targetNamespace").map(String::from);
    if target_namespace.is_none() {
        tracing::warn!("target namespace not found in schema");
    }
    let version = FormVersion::from_declared(ci_attribute(schema_root, "version"));
    let uiversion = FormVersion::from_declared(ci_attribute(schema_root, "uiversion"));

    let mut builder = SchemaTreeBuilder::new();
    collect_types(schema_root, &mut builder)?;

    let mut roots = Vec::new();
    add_child_elements(&mut builder, None, schema_root, &mut roots)?;

    let root = match roots.len() {
        0 => return Err(SchemaError::NoRootElement),
        1 => roots[0],
        count => return Err(SchemaError::MultipleRoots { count }),
    };

    Ok(builder.finish(target_namespace, version, uiversion, root))
}

/// Collect named simpleType definitions ahead of the element walk.
///
/// Two phases so that a `list` may reference an item type declared later
/// in the document.
fn collect_types(schema_root: Node<'_, '_>, builder: &mut SchemaTreeBuilder) -> Result<()> {
    let mut pending_lists: Vec<(String, String)> = Vec::new();

    for node in schema_root
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "simpleType")
    {
        let Some(name) = node.attribute("name") else {
            // Anonymous inline simpleTypes are not produced by the schema
            // generator and carry no name to resolve against.
            tracing::warn!("skipping anonymous simpleType definition");
            continue;
        };
        let mut simple_type = SimpleType::new(name);

        for child in node.children().filter(|n| n.is_element()) {
            match child.tag_name().name() {
                "restriction" => {
                    for enumeration in child
                        .children()
                        .filter(|n| n.is_element() && n.tag_name().name() == "enumeration")
                    {
                        if let Some(value) = enumeration.attribute("value") {
                            simple_type.allowed_values.push(value.trim().to_string());
                        }
                    }
                }
                "list" => {
                    if let Some(item_type) = child.attribute("itemType") {
                        pending_lists.push((name.to_string(), item_type.to_string()));
                    }
                }
                _ => {}
            }
        }
        builder.define_type(simple_type);
    }

    for (list_name, item_type) in pending_lists {
        let values = builder
            .named_type(&item_type)
            .map(|ty| ty.allowed_values.clone())
            .ok_or(SchemaError::UnresolvedItemType {
                name: item_type.clone(),
            })?;
        let mut list_type = builder
            .named_type(&list_name)
            .cloned()
            .unwrap_or_else(|| SimpleType::new(&list_name));
        list_type.multiselect_values = values;
        builder.define_type(list_type);
    }

    Ok(())
}

/// Walk element children, skipping transparently through wrapper tags
fn add_child_elements(
    builder: &mut SchemaTreeBuilder,
    parent: Option<NodeId>,
    xml_node: Node<'_, '_>,
    roots: &mut Vec<NodeId>,
) -> Result<()> {
    for child in xml_node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "element" => {
                let name = child.attribute("name").ok_or_else(|| {
                    SchemaError::MissingElementName {
                        parent: parent
                            .map(|id| builder.path_of(id).to_string())
                            .unwrap_or_else(|| "(schema)".to_string()),
                    }
                })?;
                let repeatable = max_occurs_repeats(child);
                let kind = scalar_kind(builder, child.attribute("type"));
                let id = builder.add_node(parent, name, kind, repeatable);
                if parent.is_none() {
                    roots.push(id);
                }
                add_child_elements(builder, Some(id), child, roots)?;
                // Nested elements make this a grouping node, whatever its
                // declared type attribute said.
                if builder.has_children(id) {
                    builder.set_kind(id, NodeKind::Group);
                }
            }
            // Named types were collected in the first pass
            "simpleType" => {}
            _ => add_child_elements(builder, parent, child, roots)?,
        }
    }
    Ok(())
}

fn scalar_kind(builder: &SchemaTreeBuilder, type_attr: Option<&str>) -> NodeKind {
    match type_attr {
        Some(name) => match builder.named_type(name) {
            Some(simple_type) => NodeKind::Scalar(ScalarKind::Enumerated(simple_type.clone())),
            None => NodeKind::Scalar(ScalarKind::Builtin(name.to_string())),
        },
        None => NodeKind::Scalar(ScalarKind::Untyped),
    }
}

/// An element repeats when maxOccurs allows more than one occurrence
fn max_occurs_repeats(node: Node<'_, '_>) -> bool {
    match node.attribute("maxOccurs") {
        None => false,
        Some(value) => {
            let value = value.trim();
            value == "unbounded" || value.parse::<u64>().map(|n| n > 1).unwrap_or(false)
        }
    }
}

/// Case-insensitive attribute lookup, as the legacy schema sources require
fn ci_attribute<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attributes()
        .find(|attr| attr.name().eq_ignore_ascii_case(name))
        .map(|attr| attr.value())
}
