//! Typed attribute values used by combiner parameters and obligations.

use serde::{Deserialize, Serialize};

/// XML Schema data type URI prefix
const XS: &str = "http://www.w3.org/2001/XMLSchema#";

/// Typed attribute value
///
/// Floating-point types are not carried: values must hash and compare
/// structurally so obligations can be deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    /// `xs:string`
    String(String),
    /// `xs:boolean`
    Boolean(bool),
    /// `xs:integer`
    Integer(i64),
    /// `xs:anyURI`
    AnyUri(String),
}

impl AttributeValue {
    /// Data type URI of this value
    #[must_use]
    pub fn data_type(&self) -> String {
        let local = match self {
            Self::String(_) => "string",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::AnyUri(_) => "anyURI",
        };
        format!("{}{}", XS, local)
    }

    /// Lexical form of the value
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::String(s) | Self::AnyUri(s) => s.clone(),
            Self::Boolean(b) => b.to_string(),
            Self::Integer(i) => i.to_string(),
        }
    }
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Attribute assignment inside an obligation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributeAssignment {
    /// Attribute identifier
    pub attribute_id: String,
    /// Assigned value
    pub value: AttributeValue,
}

impl AttributeAssignment {
    /// Create a new assignment
    #[must_use]
    pub fn new(attribute_id: impl Into<String>, value: AttributeValue) -> Self {
        Self {
            attribute_id: attribute_id.into(),
            value,
        }
    }
}
