//! Decision model: decisions, effects, status and obligations.
//!
//! An [`EvalResult`] is what every rule, policy and combining algorithm
//! produces. Results are built once and never mutated afterwards; the
//! `with_*` builders consume and return the value.

use crate::attribute::AttributeAssignment;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Outcome of evaluating a rule or policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Access is permitted
    Permit,
    /// Access is denied
    Deny,
    /// Evaluation failed; see the status
    Indeterminate,
    /// Nothing applied to the request
    NotApplicable,
}

impl Decision {
    /// Effect corresponding to this decision, if any
    #[must_use]
    pub const fn effect(self) -> Option<Effect> {
        match self {
            Self::Permit => Some(Effect::Permit),
            Self::Deny => Some(Effect::Deny),
            Self::Indeterminate | Self::NotApplicable => None,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Permit => "Permit",
            Self::Deny => "Deny",
            Self::Indeterminate => "Indeterminate",
            Self::NotApplicable => "NotApplicable",
        };
        f.write_str(s)
    }
}

/// Static effect of a rule, or the trigger of an obligation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// Permit
    Permit,
    /// Deny
    Deny,
}

impl Effect {
    /// Decision this effect produces
    #[must_use]
    pub const fn decision(self) -> Decision {
        match self {
            Self::Permit => Decision::Permit,
            Self::Deny => Decision::Deny,
        }
    }

    /// The other effect
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Permit => Self::Deny,
            Self::Deny => Self::Permit,
        }
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.decision().fmt(f)
    }
}

/// XACML status code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusCode {
    /// `urn:oasis:names:tc:xacml:1.0:status:ok`
    Ok,
    /// `urn:oasis:names:tc:xacml:1.0:status:missing-attribute`
    MissingAttribute,
    /// `urn:oasis:names:tc:xacml:1.0:status:syntax-error`
    SyntaxError,
    /// `urn:oasis:names:tc:xacml:1.0:status:processing-error`
    ProcessingError,
    /// Any other code URI
    Other(String),
}

impl StatusCode {
    /// Status code URI prefix
    pub const PREFIX: &'static str = "urn:oasis:names:tc:xacml:1.0:status:";

    /// URI form of this code
    #[must_use]
    pub fn uri(&self) -> String {
        match self {
            Self::Ok => format!("{}ok", Self::PREFIX),
            Self::MissingAttribute => format!("{}missing-attribute", Self::PREFIX),
            Self::SyntaxError => format!("{}syntax-error", Self::PREFIX),
            Self::ProcessingError => format!("{}processing-error", Self::PREFIX),
            Self::Other(uri) => uri.clone(),
        }
    }
}

impl From<String> for StatusCode {
    fn from(uri: String) -> Self {
        match uri.strip_prefix(Self::PREFIX) {
            Some("ok") => Self::Ok,
            Some("missing-attribute") => Self::MissingAttribute,
            Some("syntax-error") => Self::SyntaxError,
            Some("processing-error") => Self::ProcessingError,
            _ => Self::Other(uri),
        }
    }
}

impl From<StatusCode> for String {
    fn from(code: StatusCode) -> Self {
        code.uri()
    }
}

/// Status attached to a result
///
/// `codes[0]` is the top-level code; later entries are nested minor codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Status {
    /// Status codes, outermost first
    pub codes: Vec<StatusCode>,
    /// Human-readable message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Status {
    /// Create a status from a single code
    #[must_use]
    pub fn new(code: StatusCode) -> Self {
        Self {
            codes: vec![code],
            message: None,
        }
    }

    /// The `ok` status
    #[must_use]
    pub fn ok() -> Self {
        Self::new(StatusCode::Ok)
    }

    /// A processing-error status with a message
    #[must_use]
    pub fn processing_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::ProcessingError).with_message(message)
    }

    /// Set the message
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Top-level code
    #[must_use]
    pub fn code(&self) -> Option<&StatusCode> {
        self.codes.first()
    }
}

/// Directive the PEP must fulfil alongside a Permit or Deny decision
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Obligation {
    /// Obligation identifier URI
    pub id: String,
    /// Decision on which this obligation applies
    pub fulfill_on: Effect,
    /// Attribute assignments, in document order
    #[serde(default)]
    pub assignments: Vec<AttributeAssignment>,
}

impl Obligation {
    /// Create an obligation without assignments
    #[must_use]
    pub fn new(id: impl Into<String>, fulfill_on: Effect) -> Self {
        Self {
            id: id.into(),
            fulfill_on,
            assignments: Vec::new(),
        }
    }

    /// Add an assignment
    #[must_use]
    pub fn with_assignment(mut self, assignment: AttributeAssignment) -> Self {
        self.assignments.push(assignment);
        self
    }

    /// Whether this obligation applies to the given decision
    #[must_use]
    pub fn applies_to(&self, decision: Decision) -> bool {
        decision.effect() == Some(self.fulfill_on)
    }
}

/// Result of evaluating a rule, policy or combining algorithm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalResult {
    decision: Decision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<Status>,
    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    obligations: IndexSet<Obligation>,
}

impl EvalResult {
    /// Create a result with no status and no obligations
    #[must_use]
    pub fn new(decision: Decision, resource_id: Option<String>) -> Self {
        Self {
            decision,
            resource_id,
            status: None,
            obligations: IndexSet::new(),
        }
    }

    /// Create an Indeterminate result carrying a status
    #[must_use]
    pub fn indeterminate(status: Status, resource_id: Option<String>) -> Self {
        Self::new(Decision::Indeterminate, resource_id).with_status(status)
    }

    /// Create a NotApplicable result
    #[must_use]
    pub fn not_applicable(resource_id: Option<String>) -> Self {
        Self::new(Decision::NotApplicable, resource_id)
    }

    /// Attach a status
    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach obligations; duplicates collapse
    #[must_use]
    pub fn with_obligations(mut self, obligations: impl IntoIterator<Item = Obligation>) -> Self {
        self.obligations.extend(obligations);
        self
    }

    /// Drop every obligation whose fulfill-on effect differs from the decision
    #[must_use]
    pub fn retain_fulfilled(mut self) -> Self {
        let decision = self.decision;
        self.obligations.retain(|o| o.applies_to(decision));
        self
    }

    /// The decision
    #[must_use]
    pub fn decision(&self) -> Decision {
        self.decision
    }

    /// Resource identifier this result is stamped with
    #[must_use]
    pub fn resource_id(&self) -> Option<&str> {
        self.resource_id.as_deref()
    }

    /// Status, if any
    #[must_use]
    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    /// Obligations in insertion order
    #[must_use]
    pub fn obligations(&self) -> &IndexSet<Obligation> {
        &self.obligations
    }

    /// Consume the result, returning its obligations
    #[must_use]
    pub fn into_obligations(self) -> IndexSet<Obligation> {
        self.obligations
    }
}
