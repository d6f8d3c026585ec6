//! The combining-algorithm contract and the standard identifiers.

use crate::element::{CombinerElement, CombinerParameter};
use arbiter_core::{AlgorithmId, EvalResult, EvaluationCtx};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard XACML combining-algorithm identifiers
pub mod ids {
    /// Rule deny-overrides (XACML 1.0)
    pub const RULE_DENY_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:deny-overrides";
    /// Rule ordered-deny-overrides (XACML 1.1)
    pub const RULE_ORDERED_DENY_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:1.1:rule-combining-algorithm:ordered-deny-overrides";
    /// Rule permit-overrides (XACML 1.0)
    pub const RULE_PERMIT_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:permit-overrides";
    /// Rule ordered-permit-overrides (XACML 1.1)
    pub const RULE_ORDERED_PERMIT_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:1.1:rule-combining-algorithm:ordered-permit-overrides";
    /// Rule first-applicable (XACML 1.0)
    pub const RULE_FIRST_APPLICABLE: &str =
        "urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:first-applicable";

    /// Policy deny-overrides (XACML 1.0)
    pub const POLICY_DENY_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:deny-overrides";
    /// Policy ordered-deny-overrides (XACML 1.1)
    pub const POLICY_ORDERED_DENY_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:1.1:policy-combining-algorithm:ordered-deny-overrides";
    /// Policy permit-overrides (XACML 1.0)
    pub const POLICY_PERMIT_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:permit-overrides";
    /// Policy ordered-permit-overrides (XACML 1.1)
    pub const POLICY_ORDERED_PERMIT_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:1.1:policy-combining-algorithm:ordered-permit-overrides";
    /// Policy first-applicable (XACML 1.0)
    pub const POLICY_FIRST_APPLICABLE: &str =
        "urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:first-applicable";
    /// Policy only-one-applicable (XACML 1.0)
    pub const POLICY_ONLY_ONE_APPLICABLE: &str =
        "urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:only-one-applicable";
}

/// Whether an algorithm combines rules or policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmKind {
    /// Combines rules inside a policy
    Rule,
    /// Combines policies inside a policy set
    Policy,
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rule => f.write_str("rule"),
            Self::Policy => f.write_str("policy"),
        }
    }
}

/// A combining algorithm
///
/// Implementations hold no mutable state and may be called from any thread.
/// `combine` is total: child failures are reported in-band as Indeterminate.
pub trait CombiningAlgorithm: Send + Sync + fmt::Debug {
    /// Identifier this algorithm is registered under
    fn identifier(&self) -> &AlgorithmId;

    /// Rule or policy combining
    fn kind(&self) -> AlgorithmKind;

    /// Combine the children's decisions into one
    fn combine(
        &self,
        ctx: &EvaluationCtx,
        parameters: &[CombinerParameter],
        elements: &[CombinerElement],
    ) -> EvalResult;
}
