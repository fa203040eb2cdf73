//! Content digests for registry integrity verification

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA256 digest of a schema source document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceDigest(String);

impl SourceDigest {
    /// Compute the digest of raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Compute the digest of a schema source text
    pub fn from_source(source: &str) -> Self {
        Self::from_bytes(source.as_bytes())
    }

    /// The hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a source text matches this digest
    pub fn verify(&self, source: &str) -> bool {
        let computed = Self::from_source(source);
        self.0 == computed.0
    }
}

impl fmt::Display for SourceDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SourceDigest {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_deterministic() {
        let source = "<schema targetNamespace=\"http://example.org/f\"/>";
        assert_eq!(
            SourceDigest::from_source(source),
            SourceDigest::from_source(source)
        );
    }

    #[test]
    fn test_digest_distinguishes_content() {
        let a = SourceDigest::from_source("<schema version=\"1\"/>");
        let b = SourceDigest::from_source("<schema version=\"2\"/>");
        assert_ne!(a, b);
    }

    #[test]
    fn test_verification() {
        let source = "<schema/>";
        let digest = SourceDigest::from_source(source);
        assert!(digest.verify(source));
        assert!(!digest.verify("<schema version=\"1\"/>"));
    }
}
