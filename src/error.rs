//! Error types for the schema engine

use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema engine errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Schema parse error at {row}:{col}: {message}")]
    Parse { message: String, row: u32, col: u32 },

    #[error("Poorly formed schema: {count} root elements, expected exactly one")]
    MultipleRoots { count: usize },

    #[error("Schema defines no root element")]
    NoRootElement,

    #[error("Element under '{parent}' is missing its name attribute")]
    MissingElementName { parent: String },

    #[error("List type references undefined item type '{name}'")]
    UnresolvedItemType { name: String },

    #[error("Schema has no target namespace (xmlns)")]
    MissingNamespace,

    #[error("Form not found: {namespace} version {version}")]
    NotFound { namespace: String, version: String },

    #[error("Immutability violation: breaking change to {namespace} requires a version above {version}")]
    ImmutabilityViolation { namespace: String, version: String },

    #[error("Incompatible schema change: {0}")]
    IncompatibleChange(String),

    #[error("Digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<roxmltree::Error> for SchemaError {
    fn from(err: roxmltree::Error) -> Self {
        let pos = err.pos();
        SchemaError::Parse {
            message: err.to_string(),
            row: pos.row,
            col: pos.col,
        }
    }
}
