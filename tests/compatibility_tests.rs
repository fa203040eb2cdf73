//! Compatibility scenarios between versions of a patient followup form
//!
//! Each fixture under `tests/data/` is one revision of the same form; the
//! tests pin down exactly which paths each kind of change reports.

use std::collections::BTreeSet;

use xform_schemas::{SchemaDiff, SchemaTree};

const BASE: &str = include_str!("data/followup.xsd");
const THREE_ADDED: &str = include_str!("data/followup_3_added.xsd");
const ENUM_CHANGED: &str = include_str!("data/followup_enum_changed.xsd");
const LEAF_REPEATS: &str = include_str!("data/followup_leaf_repeats.xsd");
const GROUP_FLIPPED: &str = include_str!("data/followup_group_repeats.xsd");
const TYPES_CHANGED: &str = include_str!("data/followup_types_changed.xsd");

fn parse(source: &str) -> SchemaTree {
    SchemaTree::parse(source).expect("fixture should parse")
}

fn diff(old: &str, new: &str) -> SchemaDiff {
    parse(old).diff(&parse(new))
}

fn paths(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn identical_schemas_have_no_differences() {
    for fixture in [
        BASE,
        THREE_ADDED,
        ENUM_CHANGED,
        LEAF_REPEATS,
        GROUP_FLIPPED,
        TYPES_CHANGED,
    ] {
        let tree = parse(fixture);
        let result = tree.diff(&parse(fixture));
        assert!(result.is_empty(), "non-empty self diff: {}", result);
        assert!(tree.is_compatible_with(&parse(fixture)));
    }
}

#[test]
fn three_new_fields_are_reported_as_added() {
    let result = diff(BASE, THREE_ADDED);
    assert_eq!(
        result.fields_added,
        paths(&[
            "followup/patient/age",
            "followup/patient/phone",
            "followup/patient/village",
        ])
    );
    assert!(result.fields_removed.is_empty());
    assert!(result.fields_changed.is_empty());
    assert!(result.types_changed.is_empty());
    assert!(result.is_backward_compatible());
}

#[test]
fn added_fields_become_removed_when_arguments_swap() {
    let forward = diff(BASE, THREE_ADDED);
    let backward = diff(THREE_ADDED, BASE);
    assert_eq!(forward.fields_added, backward.fields_removed);
    assert_eq!(forward.fields_removed, backward.fields_added);
    assert!(!backward.is_backward_compatible());
}

#[test]
fn enum_value_change_is_a_type_change() {
    let result = diff(BASE, ENUM_CHANGED);
    assert_eq!(
        result.types_changed,
        paths(&["followup/patient/followup_type"])
    );
    assert!(result.fields_added.is_empty());
    assert!(result.fields_removed.is_empty());
    assert!(result.fields_changed.is_empty());
}

#[test]
fn leaf_repeatability_flip_changes_one_path() {
    let result = diff(BASE, LEAF_REPEATS);
    assert_eq!(result.fields_changed, paths(&["followup/patient/weight"]));
    assert!(result.fields_added.is_empty());
    assert!(result.fields_removed.is_empty());
    assert!(result.types_changed.is_empty());
}

#[test]
fn group_repeatability_flip_propagates_to_children() {
    // The group plus its single child: two changed paths
    let result = diff(BASE, GROUP_FLIPPED);
    assert_eq!(
        result.fields_changed,
        paths(&["followup/symptoms", "followup/symptoms/symptom"])
    );
    assert_eq!(result.fields_changed.len(), 2);
    assert!(result.types_changed.is_empty());
}

#[test]
fn declared_type_changes_cover_field_and_derived_meta() {
    let result = diff(BASE, TYPES_CHANGED);
    assert_eq!(
        result.types_changed,
        paths(&[
            "followup/meta/timeend",
            "followup/meta/timestart",
            "followup/patient/weight",
        ])
    );
    assert_eq!(result.types_changed.len(), 3);
    assert!(result.fields_added.is_empty());
    assert!(result.fields_removed.is_empty());
    assert!(result.fields_changed.is_empty());
}

#[test]
fn changed_sets_are_symmetric_under_swap() {
    for fixture in [ENUM_CHANGED, LEAF_REPEATS, GROUP_FLIPPED, TYPES_CHANGED] {
        let forward = diff(BASE, fixture);
        let backward = diff(fixture, BASE);
        assert_eq!(forward.fields_changed, backward.fields_changed);
        assert_eq!(forward.types_changed, backward.types_changed);
    }
}

#[test]
fn only_pure_additions_are_backward_compatible() {
    assert!(diff(BASE, THREE_ADDED).is_backward_compatible());
    assert!(!diff(BASE, ENUM_CHANGED).is_backward_compatible());
    assert!(!diff(BASE, LEAF_REPEATS).is_backward_compatible());
    assert!(!diff(BASE, GROUP_FLIPPED).is_backward_compatible());
    assert!(!diff(BASE, TYPES_CHANGED).is_backward_compatible());
}
