//! Form-level validation
//!
//! Collects warnings and errors about a parsed form definition: namespace
//! problems, version problems, and meta block field audits. Validation is
//! advisory; it never mutates the tree and reports issues as data.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema::SchemaTree;

const NAMESPACE_HELP: &str = "Find the block in your xform labeled <instance> and add an \
xmlns attribute to the first element so it looks like: \
<instance><node xmlns=\"http://your.xmlns.goes/here\">. An xmlns is a unique attribute \
that helps identify the form";

/// Metadata fields every form's meta block is expected to declare
pub const EXPECTED_META_FIELDS: [&str; 6] = [
    "deviceid",
    "timestart",
    "timeend",
    "username",
    "chw_id",
    "uid",
];

/// Meta fields that are recognized but no longer required
pub const OPTIONAL_META_FIELDS: [&str; 2] = ["formname", "formversion"];

/// Validation issue code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationCode {
    /// No target namespace declared
    MissingNamespace,
    /// Namespace is a generic default, not unique to the form
    NonUniqueNamespace,
    /// No version attribute declared
    MissingVersion,
    /// Version attribute present but not an integer
    MalformedVersion,
    /// Form has no meta block
    MissingMeta,
    /// Expected meta field absent
    MissingMetaField,
    /// Meta field declared more than once
    DuplicateMetaField,
    /// Unrecognized meta field
    ExtraMetaField,
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingNamespace => "E001",
            Self::NonUniqueNamespace => "E002",
            Self::MissingMetaField => "E003",
            Self::DuplicateMetaField => "E004",
            Self::MissingVersion => "W001",
            Self::MalformedVersion => "W002",
            Self::MissingMeta => "W003",
            Self::ExtraMetaField => "W004",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::MissingNamespace
            | Self::NonUniqueNamespace
            | Self::MissingMetaField
            | Self::DuplicateMetaField => Severity::Error,

            Self::MissingVersion
            | Self::MalformedVersion
            | Self::MissingMeta
            | Self::ExtraMetaField => Severity::Warning,
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Issue severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A single validation issue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Issue code
    pub code: ValidationCode,
    /// Human-readable message
    pub message: String,
    /// Remediation hint, where one exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl ValidationIssue {
    pub fn new(code: ValidationCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.severity(), self.message)?;
        if let Some(help) = &self.help {
            write!(f, "\n  - {}", help)?;
        }
        Ok(())
    }
}

/// Collection of issues from a validation pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<ValidationIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: ValidationIssue) {
        self.items.push(item);
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|i| i.severity() == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.items.iter().filter(|i| i.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.items
            .iter()
            .filter(|i| i.severity() == Severity::Warning)
    }

    pub fn all(&self) -> &[ValidationIssue] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            writeln!(f, "{}", item)?;
        }
        if !self.is_empty() {
            writeln!(
                f,
                "{} error(s), {} warning(s)",
                self.error_count(),
                self.warning_count()
            )?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a ValidationIssue;
    type IntoIter = std::slice::Iter<'a, ValidationIssue>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Validates parsed form definitions
pub struct FormValidator {
    check_meta: bool,
}

impl FormValidator {
    /// Create a validator with all checks enabled
    pub fn new() -> Self {
        Self { check_meta: true }
    }

    /// Skip the meta block audit
    pub fn without_meta_checks(mut self) -> Self {
        self.check_meta = false;
        self
    }

    /// Run all checks against a parsed schema
    pub fn validate(&self, tree: &SchemaTree) -> Diagnostics {
        let mut diags = Diagnostics::new();

        match tree.target_namespace() {
            None => {
                diags.push(
                    ValidationIssue::new(
                        ValidationCode::MissingNamespace,
                        "no namespace (xmlns) found in submitted form",
                    )
                    .with_help(NAMESPACE_HELP),
                );
            }
            // Forms submitted with a stock namespace all collide on it
            Some(ns) if ns.to_lowercase().contains("www.w3.org") => {
                diags.push(
                    ValidationIssue::new(
                        ValidationCode::NonUniqueNamespace,
                        format!("no unique namespace (xmlns) found in submitted form: {}", ns),
                    )
                    .with_help(NAMESPACE_HELP),
                );
            }
            Some(_) => {}
        }

        if tree.version().is_malformed() {
            diags.push(ValidationIssue::new(
                ValidationCode::MalformedVersion,
                format!(
                    "version attribute must be an integer but was '{}'",
                    tree.version().declared().unwrap_or_default()
                ),
            ));
        } else if !tree.version().is_valid() {
            diags.push(ValidationIssue::new(
                ValidationCode::MissingVersion,
                "no version number found in submitted form",
            ));
        }

        if self.check_meta {
            self.audit_meta(tree, &mut diags);
        }

        diags
    }

    /// Audit the meta block: every expected field present exactly once,
    /// nothing unrecognized. Extra fields only warn.
    fn audit_meta(&self, tree: &SchemaTree, diags: &mut Diagnostics) {
        let Some(meta) = tree.meta_element() else {
            diags.push(ValidationIssue::new(
                ValidationCode::MissingMeta,
                "form has no meta block",
            ));
            return;
        };

        let mut missing: Vec<&str> = EXPECTED_META_FIELDS.to_vec();
        let mut found: Vec<String> = Vec::new();

        for &child_id in &meta.children {
            let field = tree.node(child_id).short_name().to_lowercase();
            if let Some(pos) = missing.iter().position(|&f| f == field) {
                missing.remove(pos);
                found.push(field);
            } else if found.iter().any(|f| *f == field) {
                diags.push(ValidationIssue::new(
                    ValidationCode::DuplicateMetaField,
                    format!("duplicate meta field '{}'", field),
                ));
            } else if OPTIONAL_META_FIELDS.contains(&field.as_str()) {
                found.push(field);
            } else {
                diags.push(ValidationIssue::new(
                    ValidationCode::ExtraMetaField,
                    format!("unexpected meta field '{}'", field),
                ));
            }
        }

        for field in missing {
            diags.push(ValidationIssue::new(
                ValidationCode::MissingMetaField,
                format!("missing expected meta field '{}'", field),
            ));
        }
    }
}

impl Default for FormValidator {
    fn default() -> Self {
        Self::new()
    }
}
