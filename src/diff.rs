//! Schema diffing
//!
//! Compares two parsed schema versions and reports structural differences:
//! fields added or removed, repeatability changes, and type changes. The
//! diff decides whether an updated form definition can be re-registered
//! over an existing one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::schema::{SchemaTree, PATH_SEPARATOR};

/// The differences between two schema versions
///
/// A path appears in at most one of `fields_added`/`fields_removed`.
/// `fields_changed` and `types_changed` only hold paths present in both
/// trees, and are the same whichever tree is passed as the old one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDiff {
    /// Paths present in the new tree but not the old
    pub fields_added: BTreeSet<String>,
    /// Paths present in the old tree but not the new
    pub fields_removed: BTreeSet<String>,
    /// Paths whose repeatability differs, including every descendant of a
    /// grouping node whose flag flipped
    pub fields_changed: BTreeSet<String>,
    /// Paths whose scalar type or enumeration value set differs
    pub types_changed: BTreeSet<String>,
}

impl SchemaDiff {
    /// Whether the two schemas are structurally identical
    pub fn is_empty(&self) -> bool {
        self.fields_added.is_empty()
            && self.fields_removed.is_empty()
            && self.fields_changed.is_empty()
            && self.types_changed.is_empty()
    }

    /// Whether the new schema only adds fields.
    ///
    /// Removals, repeatability changes and type changes all alter how
    /// existing submissions are addressed or stored, so any of them makes
    /// the change breaking. Pure additions are safe.
    pub fn is_backward_compatible(&self) -> bool {
        self.fields_removed.is_empty()
            && self.fields_changed.is_empty()
            && self.types_changed.is_empty()
    }

    /// Total number of reported differences
    pub fn change_count(&self) -> usize {
        self.fields_added.len()
            + self.fields_removed.len()
            + self.fields_changed.len()
            + self.types_changed.len()
    }

    fn display_set(f: &mut fmt::Formatter<'_>, label: &str, set: &BTreeSet<String>) -> fmt::Result {
        if !set.is_empty() {
            let paths: Vec<&str> = set.iter().map(String::as_str).collect();
            writeln!(f, "{} {}: {}", set.len(), label, paths.join(","))?;
        }
        Ok(())
    }
}

impl fmt::Display for SchemaDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "No differences");
        }
        Self::display_set(f, "fields added", &self.fields_added)?;
        Self::display_set(f, "fields removed", &self.fields_removed)?;
        Self::display_set(f, "fields changed", &self.fields_changed)?;
        Self::display_set(f, "types changed", &self.types_changed)?;
        Ok(())
    }
}

/// Computes a [`SchemaDiff`] between two schema trees
///
/// Comparison is path-keyed, not positional: nodes are matched by their
/// qualified path, so reordering siblings is not a difference. Diffing two
/// valid trees never fails; unrelated schemas simply produce maximal
/// added/removed sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaDiffer;

impl SchemaDiffer {
    /// Create a new differ
    pub fn new() -> Self {
        Self
    }

    /// Diff `old` against `new`
    pub fn diff(&self, old: &SchemaTree, new: &SchemaTree) -> SchemaDiff {
        let old_paths: BTreeSet<&str> = old.paths().collect();
        let new_paths: BTreeSet<&str> = new.paths().collect();

        let fields_added = new_paths
            .difference(&old_paths)
            .map(|p| p.to_string())
            .collect();
        let fields_removed = old_paths
            .difference(&new_paths)
            .map(|p| p.to_string())
            .collect();

        let common: BTreeSet<String> = old_paths
            .intersection(&new_paths)
            .map(|p| p.to_string())
            .collect();

        let mut fields_changed = BTreeSet::new();
        let mut types_changed = BTreeSet::new();

        for path in &common {
            // Both lookups succeed for a common path
            let (Some(old_node), Some(new_node)) = (old.get(path), new.get(path)) else {
                continue;
            };

            if old_node.repeatable != new_node.repeatable {
                // Flipping repeatability changes the addressing and
                // cardinality of the whole subtree, so every descendant
                // present in both trees is changed along with the node.
                fields_changed.insert(path.clone());
                let prefix = format!("{}{}", path, PATH_SEPARATOR);
                for descendant in common.range(prefix.clone()..).take_while(|p| p.starts_with(&prefix)) {
                    fields_changed.insert(descendant.clone());
                }
            }

            if old_node.kind != new_node.kind {
                types_changed.insert(path.clone());
            }
        }

        SchemaDiff {
            fields_added,
            fields_removed,
            fields_changed,
            types_changed,
        }
    }
}

impl SchemaTree {
    /// Diff this schema against a newer version
    pub fn diff(&self, newer: &SchemaTree) -> SchemaDiff {
        SchemaDiffer::new().diff(self, newer)
    }

    /// Whether two form definitions are interchangeable, i.e. whether they
    /// can share the same registered storage
    pub fn is_compatible_with(&self, other: &SchemaTree) -> bool {
        self.diff(other).is_empty()
    }
}
