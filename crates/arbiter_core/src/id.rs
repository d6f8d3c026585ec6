//! Identifiers for ARBITER entities.
//!
//! Algorithms, obligations and status codes are named by URIs. Requests
//! carry a random UUID so log lines from one evaluation can be correlated.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::str::FromStr;
use uuid::Uuid;

/// URI naming a combining algorithm
///
/// Only the shape is checked: a non-empty scheme, a `:` separator, a
/// non-empty remainder, and no whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AlgorithmId(String);

impl AlgorithmId {
    /// Parse an algorithm identifier
    ///
    /// # Errors
    ///
    /// Returns error if the value is not URI-shaped
    pub fn parse(value: &str) -> CoreResult<Self> {
        validate_uri(value)?;
        Ok(Self(value.to_string()))
    }

    /// Wrap a compile-time constant URI
    ///
    /// The shape is checked in debug builds only.
    #[must_use]
    pub fn from_static(value: &'static str) -> Self {
        debug_assert!(validate_uri(value).is_ok(), "malformed algorithm URI: {}", value);
        Self(value.to_string())
    }

    /// Get as string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment, e.g. `deny-overrides`
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.0.rsplit(':').next().unwrap_or(&self.0)
    }
}

impl std::fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for AlgorithmId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for AlgorithmId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AlgorithmId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_uri(&value)?;
        Ok(Self(value))
    }
}

impl From<AlgorithmId> for String {
    fn from(id: AlgorithmId) -> Self {
        id.0
    }
}

/// Check that a string looks like an absolute URI
///
/// # Errors
///
/// Returns error describing the first violated rule
pub fn validate_uri(value: &str) -> CoreResult<()> {
    if value.is_empty() {
        return Err(CoreError::InvalidId {
            reason: "identifier is empty".to_string(),
        });
    }
    if value.chars().any(char::is_whitespace) {
        return Err(CoreError::InvalidId {
            reason: format!("identifier contains whitespace: {:?}", value),
        });
    }
    match value.split_once(':') {
        Some((scheme, rest)) if !scheme.is_empty() && !rest.is_empty() => {
            let valid_scheme = scheme
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
            if valid_scheme {
                Ok(())
            } else {
                Err(CoreError::InvalidId {
                    reason: format!("invalid URI scheme: {}", scheme),
                })
            }
        }
        _ => Err(CoreError::InvalidId {
            reason: format!("not a URI: {}", value),
        }),
    }
}

/// Request identifier - identifies a single authorization request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Create a new random RequestId
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req_{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_id_parse() {
        let id = AlgorithmId::parse(
            "urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:deny-overrides",
        )
        .unwrap();
        assert_eq!(id.short_name(), "deny-overrides");
    }

    #[test]
    fn test_algorithm_id_rejects_empty() {
        assert!(AlgorithmId::parse("").is_err());
    }

    #[test]
    fn test_algorithm_id_rejects_missing_scheme() {
        assert!(AlgorithmId::parse("deny-overrides").is_err());
        assert!(AlgorithmId::parse(":deny").is_err());
        assert!(AlgorithmId::parse("urn:").is_err());
    }

    #[test]
    fn test_algorithm_id_rejects_whitespace() {
        assert!(AlgorithmId::parse("urn:foo bar").is_err());
    }

    #[test]
    fn test_algorithm_id_rejects_bad_scheme() {
        assert!(AlgorithmId::parse("1urn:foo").is_err());
        assert!(AlgorithmId::parse("ur_n:foo").is_err());
    }

    #[test]
    fn test_algorithm_id_serde() {
        let id = AlgorithmId::parse("urn:example:alg").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"urn:example:alg\"");
        let back: AlgorithmId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        let bad: Result<AlgorithmId, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_algorithm_id_borrow_lookup() {
        let mut map = std::collections::HashMap::new();
        map.insert(AlgorithmId::from_static("urn:example:alg"), 1);
        assert_eq!(map.get("urn:example:alg"), Some(&1));
    }

    #[test]
    fn test_request_id_unique() {
        let a = RequestId::new();
        let b = RequestId::new();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("req_"));
    }
}
