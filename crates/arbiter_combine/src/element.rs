//! Combinable elements: the children a combining algorithm folds over.
//!
//! A child is a rule, a policy, a policy set or a policy reference. The
//! variant is fixed when the element is built; algorithms dispatch through
//! [`Combinable::evaluate`] and [`Combinable::match_target`] without
//! inspecting concrete types.

use arbiter_core::{AttributeValue, Effect, EvalResult, EvaluationCtx, Status};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Outcome of matching a policy target against a request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum MatchResult {
    /// The target applies
    #[default]
    Match,
    /// The target does not apply
    NoMatch,
    /// Matching failed
    Indeterminate {
        /// Why matching failed
        status: Status,
    },
}

/// A rule: evaluates to a decision and has a static effect
pub trait Rule: Send + Sync + fmt::Debug {
    /// Rule identifier
    fn id(&self) -> &str;

    /// Effect produced when the rule applies
    fn effect(&self) -> Effect;

    /// Evaluate the rule, including its own target and condition
    fn evaluate(&self, ctx: &EvaluationCtx) -> EvalResult;
}

/// A policy, policy set or reference: matched before it is evaluated
pub trait Policy: Send + Sync + fmt::Debug {
    /// Policy identifier
    fn id(&self) -> &str;

    /// Match the policy target against the request
    fn match_target(&self, ctx: &EvaluationCtx) -> MatchResult;

    /// Evaluate the policy
    fn evaluate(&self, ctx: &EvaluationCtx) -> EvalResult;
}

/// Kind of child element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// Rule
    Rule,
    /// Policy
    Policy,
    /// Policy set
    PolicySet,
    /// Reference to a policy or policy set
    Reference,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Rule => "rule",
            Self::Policy => "policy",
            Self::PolicySet => "policy_set",
            Self::Reference => "reference",
        };
        f.write_str(s)
    }
}

/// Child of a combiner element
#[derive(Debug, Clone)]
pub enum Combinable {
    /// A rule
    Rule(Arc<dyn Rule>),
    /// A policy
    Policy(Arc<dyn Policy>),
    /// A policy set
    PolicySet(Arc<dyn Policy>),
    /// A resolved policy or policy-set reference
    Reference(Arc<dyn Policy>),
}

impl Combinable {
    /// Kind of this child
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Rule(_) => ElementKind::Rule,
            Self::Policy(_) => ElementKind::Policy,
            Self::PolicySet(_) => ElementKind::PolicySet,
            Self::Reference(_) => ElementKind::Reference,
        }
    }

    /// Identifier of this child
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Rule(rule) => rule.id(),
            Self::Policy(p) | Self::PolicySet(p) | Self::Reference(p) => p.id(),
        }
    }

    /// Static effect; only rules have one
    #[must_use]
    pub fn effect(&self) -> Option<Effect> {
        match self {
            Self::Rule(rule) => Some(rule.effect()),
            _ => None,
        }
    }

    /// Match the child's target
    ///
    /// Rules check their target inside `evaluate`, so they always match here.
    #[must_use]
    pub fn match_target(&self, ctx: &EvaluationCtx) -> MatchResult {
        match self {
            Self::Rule(_) => MatchResult::Match,
            Self::Policy(p) | Self::PolicySet(p) | Self::Reference(p) => p.match_target(ctx),
        }
    }

    /// Evaluate the child
    #[must_use]
    pub fn evaluate(&self, ctx: &EvaluationCtx) -> EvalResult {
        match self {
            Self::Rule(rule) => rule.evaluate(ctx),
            Self::Policy(p) | Self::PolicySet(p) | Self::Reference(p) => p.evaluate(ctx),
        }
    }
}

/// Named parameter passed to a combining algorithm
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombinerParameter {
    /// Parameter name
    pub name: String,
    /// Parameter value
    pub value: AttributeValue,
}

impl CombinerParameter {
    /// Create a new parameter
    #[must_use]
    pub fn new(name: impl Into<String>, value: AttributeValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A child plus the parameters that apply to it
///
/// Built at policy-load time and not mutated afterwards.
#[derive(Debug, Clone)]
pub struct CombinerElement {
    child: Combinable,
    parameters: Arc<[CombinerParameter]>,
}

impl CombinerElement {
    /// Create an element without parameters
    #[must_use]
    pub fn new(child: Combinable) -> Self {
        Self {
            child,
            parameters: Arc::from(Vec::new()),
        }
    }

    /// Create an element with parameters
    #[must_use]
    pub fn with_parameters(child: Combinable, parameters: Vec<CombinerParameter>) -> Self {
        Self {
            child,
            parameters: Arc::from(parameters),
        }
    }

    /// Wrap a rule
    #[must_use]
    pub fn rule(rule: Arc<dyn Rule>) -> Self {
        Self::new(Combinable::Rule(rule))
    }

    /// Wrap a policy
    #[must_use]
    pub fn policy(policy: Arc<dyn Policy>) -> Self {
        Self::new(Combinable::Policy(policy))
    }

    /// The child
    #[must_use]
    pub fn child(&self) -> &Combinable {
        &self.child
    }

    /// Parameters in declaration order
    #[must_use]
    pub fn parameters(&self) -> &[CombinerParameter] {
        &self.parameters
    }

    /// Look up a parameter by name
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&AttributeValue> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::{ScriptedPolicy, ScriptedRule};
    use arbiter_core::Decision;

    #[test]
    fn test_rule_always_matches() {
        let rule = ScriptedRule::new("r1", Effect::Deny, Decision::Deny);
        let element = CombinerElement::rule(Arc::new(rule));
        let ctx = EvaluationCtx::new();
        assert_eq!(element.child().match_target(&ctx), MatchResult::Match);
        assert_eq!(element.child().kind(), ElementKind::Rule);
        assert_eq!(element.child().effect(), Some(Effect::Deny));
    }

    #[test]
    fn test_policy_delegates_match() {
        let policy = ScriptedPolicy::new("p1", MatchResult::NoMatch, Decision::Permit);
        let element = CombinerElement::policy(Arc::new(policy));
        let ctx = EvaluationCtx::new();
        assert_eq!(element.child().match_target(&ctx), MatchResult::NoMatch);
        assert_eq!(element.child().effect(), None);
        assert_eq!(element.child().id(), "p1");
    }

    #[test]
    fn test_policy_set_and_reference_kinds() {
        let policy: Arc<dyn Policy> =
            Arc::new(ScriptedPolicy::new("ps", MatchResult::Match, Decision::Deny));
        let set = Combinable::PolicySet(Arc::clone(&policy));
        let reference = Combinable::Reference(policy);
        assert_eq!(set.kind(), ElementKind::PolicySet);
        assert_eq!(reference.kind(), ElementKind::Reference);
        let ctx = EvaluationCtx::new();
        assert_eq!(reference.evaluate(&ctx).decision(), Decision::Deny);
    }

    #[test]
    fn test_element_parameters() {
        let rule = ScriptedRule::new("r1", Effect::Permit, Decision::Permit);
        let element = CombinerElement::with_parameters(
            Combinable::Rule(Arc::new(rule)),
            vec![
                CombinerParameter::new("weight", AttributeValue::Integer(3)),
                CombinerParameter::new("label", AttributeValue::String("a".into())),
            ],
        );
        assert_eq!(element.parameters().len(), 2);
        assert_eq!(element.parameter("weight"), Some(&AttributeValue::Integer(3)));
        assert!(element.parameter("missing").is_none());
    }

    #[test]
    fn test_match_result_serde() {
        let json = serde_json::json!({"result": "no_match"});
        let result: MatchResult = serde_json::from_value(json).unwrap();
        assert_eq!(result, MatchResult::NoMatch);

        let json = serde_json::json!({
            "result": "indeterminate",
            "status": {"codes": ["urn:oasis:names:tc:xacml:1.0:status:missing-attribute"]}
        });
        let result: MatchResult = serde_json::from_value(json).unwrap();
        assert!(matches!(result, MatchResult::Indeterminate { .. }));
    }
}
