//! Evaluation context handed to rules, policies and combining algorithms.

use crate::attribute::AttributeValue;
use crate::id::RequestId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Evaluation context
///
/// Combining algorithms only read the resource identifier, which they use
/// to stamp the results they synthesize. Request attributes are carried for
/// child elements that need them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationCtx {
    /// Request identifier
    pub request_id: RequestId,
    /// Resource being accessed
    pub resource_id: Option<String>,
    /// Request attributes
    pub attributes: IndexMap<String, AttributeValue>,
}

impl EvaluationCtx {
    /// Create a new evaluation context
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: RequestId::new(),
            resource_id: None,
            attributes: IndexMap::new(),
        }
    }

    /// Set resource ID
    #[must_use]
    pub fn with_resource(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Resource identifier to stamp synthesized results with
    #[must_use]
    pub fn resource_id(&self) -> Option<String> {
        self.resource_id.clone()
    }

    /// Look up an attribute
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }
}

impl Default for EvaluationCtx {
    fn default() -> Self {
        Self::new()
    }
}
