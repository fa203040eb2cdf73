//! Form registry
//!
//! Append-only on-disk storage for registered form definitions, keyed by
//! target namespace. Re-registration is gated on the schema diff: identical
//! schemas are a no-op, backward-compatible additions append a new entry,
//! and breaking changes are refused unless the declared form version was
//! bumped past the registered one.
//!
//! Layout: `forms/{namespace-slug}/NNN.xsd` plus a `manifest.json` per
//! namespace recording digests, versions and registration metadata.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::diff::SchemaDiff;
use crate::digest::SourceDigest;
use crate::error::{Result, SchemaError};
use crate::schema::SchemaTree;

/// What happened when a schema was submitted for registration
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterOutcome {
    /// First registration of this namespace
    Registered,
    /// Structurally identical to the latest registered schema; nothing stored
    Unchanged,
    /// Backward-compatible change appended as a new entry
    Updated(SchemaDiff),
    /// Breaking change accepted because the declared version was bumped
    Breaking(SchemaDiff),
}

/// One registered schema version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormEntry {
    /// Declared form version at registration time
    pub version: Option<u32>,
    /// Schema source file, relative to the namespace directory
    pub source_file: String,
    /// SHA256 digest of the stored source
    pub digest: SourceDigest,
    /// When this entry was registered
    pub registered_at: DateTime<Utc>,
    /// Who registered it
    pub registered_by: Option<String>,
    /// Whether this entry was a breaking change from the previous one
    pub breaking: bool,
}

/// Manifest of all registered versions for one namespace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormManifest {
    /// The form's target namespace
    pub target_namespace: String,
    /// Entries in registration order; the last one is current
    pub entries: Vec<FormEntry>,
}

/// The form registry
pub struct FormRegistry {
    /// Registry root directory
    root: PathBuf,
    /// Manifests keyed by target namespace
    manifests: HashMap<String, FormManifest>,
}

impl FormRegistry {
    /// Open an existing registry or create a new one
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        fs::create_dir_all(root.join("forms"))?;

        let mut registry = Self {
            root,
            manifests: HashMap::new(),
        };
        registry.load_manifests()?;
        Ok(registry)
    }

    /// The registry root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All registered namespaces, sorted
    pub fn namespaces(&self) -> Vec<&str> {
        let mut namespaces: Vec<_> = self.manifests.keys().map(String::as_str).collect();
        namespaces.sort();
        namespaces
    }

    /// The manifest for a namespace
    pub fn manifest(&self, namespace: &str) -> Option<&FormManifest> {
        self.manifests.get(namespace)
    }

    /// The current entry for a namespace
    pub fn latest(&self, namespace: &str) -> Option<&FormEntry> {
        self.manifests
            .get(namespace)
            .and_then(|m| m.entries.last())
    }

    /// The most recent entry registered under a declared version
    pub fn get(&self, namespace: &str, version: u32) -> Option<&FormEntry> {
        self.manifests.get(namespace).and_then(|m| {
            m.entries
                .iter()
                .rev()
                .find(|e| e.version == Some(version))
        })
    }

    /// Read the stored source for an entry
    pub fn read_source(&self, namespace: &str, entry: &FormEntry) -> Result<String> {
        let path = self
            .namespace_dir(namespace)
            .join(&entry.source_file);
        Ok(fs::read_to_string(path)?)
    }

    /// Submit a schema source for registration.
    ///
    /// Parses the source, diffs it against the latest registered schema of
    /// the same namespace, and appends an entry when the change is allowed.
    pub fn register(&mut self, source: &str, author: Option<&str>) -> Result<RegisterOutcome> {
        let tree = SchemaTree::parse(source)?;
        let namespace = tree
            .target_namespace()
            .ok_or(SchemaError::MissingNamespace)?
            .to_string();

        let Some(latest) = self.latest(&namespace).cloned() else {
            self.append_entry(&namespace, &tree, source, author, false)?;
            tracing::info!(namespace = %namespace, "registered new form");
            return Ok(RegisterOutcome::Registered);
        };

        if latest.digest.verify(source) {
            return Ok(RegisterOutcome::Unchanged);
        }

        let old_source = self.read_source(&namespace, &latest)?;
        let old_tree = SchemaTree::parse(&old_source)?;
        let diff = old_tree.diff(&tree);

        if diff.is_empty() {
            return Ok(RegisterOutcome::Unchanged);
        }

        if diff.is_backward_compatible() {
            self.append_entry(&namespace, &tree, source, author, false)?;
            tracing::info!(namespace = %namespace, changes = diff.change_count(),
                "registered compatible update");
            return Ok(RegisterOutcome::Updated(diff));
        }

        // Breaking: existing submissions no longer fit the schema, so the
        // update must declare a version above the registered one.
        match (latest.version, tree.version().number()) {
            (Some(old_version), Some(new_version)) if new_version > old_version => {
                self.append_entry(&namespace, &tree, source, author, true)?;
                tracing::warn!(namespace = %namespace, from = old_version, to = new_version,
                    "registered breaking update");
                Ok(RegisterOutcome::Breaking(diff))
            }
            (Some(old_version), _) => Err(SchemaError::ImmutabilityViolation {
                namespace,
                version: old_version.to_string(),
            }),
            (None, _) => Err(SchemaError::IncompatibleChange(format!(
                "breaking change to {} requires a declared version bump:\n{}",
                namespace, diff
            ))),
        }
    }

    /// Diff a candidate source against the latest registered schema,
    /// without registering anything
    pub fn check(&self, namespace: &str, source: &str) -> Result<SchemaDiff> {
        let latest = self.latest(namespace).ok_or_else(|| SchemaError::NotFound {
            namespace: namespace.to_string(),
            version: "latest".to_string(),
        })?;
        let old_tree = SchemaTree::parse(&self.read_source(namespace, latest)?)?;
        let new_tree = SchemaTree::parse(source)?;
        Ok(old_tree.diff(&new_tree))
    }

    /// Diff two registered versions of a namespace
    pub fn check_compatibility(
        &self,
        namespace: &str,
        from: u32,
        to: u32,
    ) -> Result<SchemaDiff> {
        let old_entry = self.get(namespace, from).ok_or_else(|| SchemaError::NotFound {
            namespace: namespace.to_string(),
            version: from.to_string(),
        })?;
        let new_entry = self.get(namespace, to).ok_or_else(|| SchemaError::NotFound {
            namespace: namespace.to_string(),
            version: to.to_string(),
        })?;

        let old_tree = SchemaTree::parse(&self.read_source(namespace, old_entry)?)?;
        let new_tree = SchemaTree::parse(&self.read_source(namespace, new_entry)?)?;
        Ok(old_tree.diff(&new_tree))
    }

    /// Verify the stored sources of a namespace against their digests
    pub fn verify(&self, namespace: &str) -> Result<()> {
        let manifest = self.manifests.get(namespace).ok_or_else(|| SchemaError::NotFound {
            namespace: namespace.to_string(),
            version: "any".to_string(),
        })?;

        for entry in &manifest.entries {
            let source = self.read_source(namespace, entry)?;
            let actual = SourceDigest::from_source(&source);
            if actual != entry.digest {
                return Err(SchemaError::DigestMismatch {
                    expected: entry.digest.to_string(),
                    actual: actual.to_string(),
                });
            }
        }
        Ok(())
    }

    fn namespace_dir(&self, namespace: &str) -> PathBuf {
        self.root.join("forms").join(namespace_slug(namespace))
    }

    fn append_entry(
        &mut self,
        namespace: &str,
        tree: &SchemaTree,
        source: &str,
        author: Option<&str>,
        breaking: bool,
    ) -> Result<()> {
        let dir = self.namespace_dir(namespace);
        fs::create_dir_all(&dir)?;

        let manifest = self
            .manifests
            .entry(namespace.to_string())
            .or_insert_with(|| FormManifest {
                target_namespace: namespace.to_string(),
                entries: Vec::new(),
            });

        let source_file = format!("{:03}.xsd", manifest.entries.len());
        fs::write(dir.join(&source_file), source)?;

        manifest.entries.push(FormEntry {
            version: tree.version().number(),
            source_file,
            digest: SourceDigest::from_source(source),
            registered_at: Utc::now(),
            registered_by: author.map(String::from),
            breaking,
        });

        let manifest_content = serde_json::to_string_pretty(manifest)?;
        fs::write(dir.join("manifest.json"), manifest_content)?;
        Ok(())
    }

    /// Load all manifests from disk
    fn load_manifests(&mut self) -> Result<()> {
        let forms_dir = self.root.join("forms");
        for entry in WalkDir::new(&forms_dir)
            .min_depth(2)
            .max_depth(2)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.file_name() == "manifest.json" {
                let content = fs::read_to_string(entry.path())?;
                let manifest: FormManifest = serde_json::from_str(&content)?;
                self.manifests
                    .insert(manifest.target_namespace.clone(), manifest);
            }
        }
        Ok(())
    }
}

/// Turn a namespace into a directory name, the way form namespaces are
/// flattened into table names elsewhere in the platform
fn namespace_slug(namespace: &str) -> String {
    namespace
        .trim_start_matches("http://")
        .trim_start_matches("https://")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn schema(version: &str, fields: &str) -> String {
        format!(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                   targetNamespace="http://example.org/visit" version="{}">
                 <xs:element name="visit">
                   <xs:complexType><xs:sequence>{}</xs:sequence></xs:complexType>
                 </xs:element>
               </xs:schema>"#,
            version, fields
        )
    }

    const BASE_FIELDS: &str = r#"
        <xs:element name="name" type="xs:string"/>
        <xs:element name="age" type="xs:int"/>"#;

    #[test]
    fn test_open_empty_registry() {
        let dir = tempdir().unwrap();
        let registry = FormRegistry::open(dir.path()).unwrap();
        assert!(registry.namespaces().is_empty());
    }

    #[test]
    fn test_register_and_reload() {
        let dir = tempdir().unwrap();
        let mut registry = FormRegistry::open(dir.path()).unwrap();

        let outcome = registry.register(&schema("1", BASE_FIELDS), Some("tester")).unwrap();
        assert_eq!(outcome, RegisterOutcome::Registered);

        // A fresh handle sees the persisted manifest
        let reloaded = FormRegistry::open(dir.path()).unwrap();
        assert_eq!(reloaded.namespaces(), vec!["http://example.org/visit"]);
        let latest = reloaded.latest("http://example.org/visit").unwrap();
        assert_eq!(latest.version, Some(1));
        assert_eq!(latest.registered_by.as_deref(), Some("tester"));
        assert!(!latest.breaking);
    }

    #[test]
    fn test_identical_reregistration_is_a_noop() {
        let dir = tempdir().unwrap();
        let mut registry = FormRegistry::open(dir.path()).unwrap();
        registry.register(&schema("1", BASE_FIELDS), None).unwrap();

        let outcome = registry.register(&schema("1", BASE_FIELDS), None).unwrap();
        assert_eq!(outcome, RegisterOutcome::Unchanged);
        assert_eq!(
            registry.manifest("http://example.org/visit").unwrap().entries.len(),
            1
        );
    }

    #[test]
    fn test_compatible_addition_appends() {
        let dir = tempdir().unwrap();
        let mut registry = FormRegistry::open(dir.path()).unwrap();
        registry.register(&schema("1", BASE_FIELDS), None).unwrap();

        let extended = format!(
            "{}\n<xs:element name=\"village\" type=\"xs:string\"/>",
            BASE_FIELDS
        );
        match registry.register(&schema("1", &extended), None).unwrap() {
            RegisterOutcome::Updated(diff) => {
                assert_eq!(diff.fields_added.len(), 1);
                assert!(diff.is_backward_compatible());
            }
            other => panic!("expected Updated, got {:?}", other),
        }
        assert_eq!(
            registry.manifest("http://example.org/visit").unwrap().entries.len(),
            2
        );
    }

    #[test]
    fn test_breaking_change_requires_version_bump() {
        let dir = tempdir().unwrap();
        let mut registry = FormRegistry::open(dir.path()).unwrap();
        registry.register(&schema("1", BASE_FIELDS), None).unwrap();

        // age dropped, same version: refused
        let narrowed = r#"<xs:element name="name" type="xs:string"/>"#;
        match registry.register(&schema("1", narrowed), None) {
            Err(SchemaError::ImmutabilityViolation { version, .. }) => {
                assert_eq!(version, "1");
            }
            other => panic!("expected ImmutabilityViolation, got {:?}", other),
        }

        // same change with a version bump: accepted and flagged
        match registry.register(&schema("2", narrowed), None).unwrap() {
            RegisterOutcome::Breaking(diff) => {
                assert_eq!(diff.fields_removed.len(), 1);
            }
            other => panic!("expected Breaking, got {:?}", other),
        }
        let latest = registry.latest("http://example.org/visit").unwrap();
        assert!(latest.breaking);
        assert_eq!(latest.version, Some(2));
    }

    #[test]
    fn test_check_does_not_register() {
        let dir = tempdir().unwrap();
        let mut registry = FormRegistry::open(dir.path()).unwrap();
        registry.register(&schema("1", BASE_FIELDS), None).unwrap();

        let narrowed = r#"<xs:element name="name" type="xs:string"/>"#;
        let diff = registry
            .check("http://example.org/visit", &schema("1", narrowed))
            .unwrap();
        assert!(!diff.is_backward_compatible());
        assert_eq!(
            registry.manifest("http://example.org/visit").unwrap().entries.len(),
            1
        );
    }

    #[test]
    fn test_check_compatibility_between_versions() {
        let dir = tempdir().unwrap();
        let mut registry = FormRegistry::open(dir.path()).unwrap();
        registry.register(&schema("1", BASE_FIELDS), None).unwrap();
        registry
            .register(&schema("2", r#"<xs:element name="name" type="xs:string"/>"#), None)
            .unwrap();

        let diff = registry
            .check_compatibility("http://example.org/visit", 1, 2)
            .unwrap();
        assert_eq!(diff.fields_removed.len(), 1);

        let missing = registry.check_compatibility("http://example.org/visit", 1, 9);
        assert!(matches!(missing, Err(SchemaError::NotFound { .. })));
    }

    #[test]
    fn test_verify_detects_tampering() {
        let dir = tempdir().unwrap();
        let mut registry = FormRegistry::open(dir.path()).unwrap();
        registry.register(&schema("1", BASE_FIELDS), None).unwrap();
        registry.verify("http://example.org/visit").unwrap();

        let stored = dir.path().join("forms").join("example_org_visit").join("000.xsd");
        fs::write(&stored, "tampered").unwrap();
        assert!(matches!(
            registry.verify("http://example.org/visit"),
            Err(SchemaError::DigestMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_namespace_rejected() {
        let dir = tempdir().unwrap();
        let mut registry = FormRegistry::open(dir.path()).unwrap();
        let source = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:element name="form" type="xs:string"/></xs:schema>"#;
        assert!(matches!(
            registry.register(source, None),
            Err(SchemaError::MissingNamespace)
        ));
    }
}
