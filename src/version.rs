//! Form version handling
//!
//! XForm schemas carry `version` and `uiversion` attributes on the schema
//! element. Both must be decimal integers; anything else is coerced to
//! undeclared rather than rejected, so that badly versioned forms can still
//! be parsed and inspected. Validation reports the coercion separately.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A version attribute as declared on a form definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormVersion {
    /// The raw attribute value, exactly as written in the source
    raw: Option<String>,
    /// The parsed version number, if the raw value was a valid integer
    number: Option<u32>,
}

impl FormVersion {
    /// Build from a raw attribute value, coercing invalid values to undeclared
    pub fn from_declared(raw: Option<&str>) -> Self {
        let number = raw.and_then(|v| {
            let trimmed = v.trim();
            if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
                trimmed.parse().ok()
            } else {
                tracing::warn!(value = v, "ignoring non-integer version attribute");
                None
            }
        });
        Self {
            raw: raw.map(String::from),
            number,
        }
    }

    /// The version number, if one was validly declared
    pub fn number(&self) -> Option<u32> {
        self.number
    }

    /// The raw declared attribute value, valid or not
    pub fn declared(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// Whether the attribute was present and a valid integer
    pub fn is_valid(&self) -> bool {
        self.number.is_some()
    }

    /// Whether the attribute was present but not a valid integer
    pub fn is_malformed(&self) -> bool {
        self.raw.is_some() && self.number.is_none()
    }
}

impl fmt::Display for FormVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.number {
            Some(n) => write!(f, "v{}", n),
            None => write!(f, "unversioned"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_version() {
        let v = FormVersion::from_declared(Some("3"));
        assert_eq!(v.number(), Some(3));
        assert!(v.is_valid());
        assert_eq!(v.to_string(), "v3");
    }

    #[test]
    fn test_version_whitespace_trimmed() {
        let v = FormVersion::from_declared(Some(" 12 "));
        assert_eq!(v.number(), Some(12));
    }

    #[test]
    fn test_non_integer_coerced_to_undeclared() {
        let v = FormVersion::from_declared(Some("1.2"));
        assert_eq!(v.number(), None);
        assert!(v.is_malformed());
        assert_eq!(v.declared(), Some("1.2"));
        assert_eq!(v.to_string(), "unversioned");
    }

    #[test]
    fn test_missing_version() {
        let v = FormVersion::from_declared(None);
        assert_eq!(v.number(), None);
        assert!(!v.is_malformed());
        assert!(!v.is_valid());
    }
}
