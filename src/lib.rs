//! XForm Schema Compatibility Engine
//!
//! Parses XSD-like form definitions into immutable schema trees, computes
//! structural diffs between schema versions, and gates re-registration of
//! updated forms on the result.
//!
//! ## Features
//!
//! - **Structural Diffing**: Path-keyed comparison of schema trees — added,
//!   removed, repeatability-changed and type-changed fields
//! - **Repeat Propagation**: Flipping a group's repeatability marks every
//!   descendant as changed, since it alters the whole subtree's addressing
//! - **Form Validation**: Namespace, version and meta block audits with
//!   coded warnings and errors
//! - **Append-Only Registry**: File-backed storage of registered forms with
//!   digest verification and compatibility-gated updates
//!
//! ## Architecture
//!
//! ```text
//! schema source (XSD)
//!   └── parser ──> SchemaTree (immutable, path-indexed)
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//!   SchemaDiffer ──> SchemaDiff   FormValidator ──> Diagnostics
//!         │
//!         ▼
//!   FormRegistry (register / check / verify)
//! ```

pub mod config;
pub mod diff;
pub mod digest;
pub mod error;
pub mod parser;
pub mod registry;
pub mod schema;
pub mod validate;
pub mod version;

pub use config::XformConfig;
pub use diff::{SchemaDiff, SchemaDiffer};
pub use digest::SourceDigest;
pub use error::{Result, SchemaError};
pub use registry::{FormRegistry, RegisterOutcome};
pub use schema::{NodeId, NodeKind, ScalarKind, SchemaNode, SchemaTree, SimpleType};
pub use validate::{Diagnostics, FormValidator, Severity, ValidationCode, ValidationIssue};
pub use version::FormVersion;
