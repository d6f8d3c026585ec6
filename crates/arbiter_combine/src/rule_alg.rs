//! Rule-combining algorithms.
//!
//! Deny-overrides and permit-overrides are mirror images and share one
//! fold. The ordered variants run the same fold; their identifiers only
//! promise that rules are evaluated in document order, which every
//! algorithm here does anyway.

use crate::algorithm::{ids, AlgorithmKind, CombiningAlgorithm};
use crate::element::{CombinerElement, CombinerParameter};
use arbiter_core::{AlgorithmId, Decision, Effect, EvalResult, EvaluationCtx};

/// Fold shared by deny- and permit-overrides
///
/// A result equal to `overriding` is returned as soon as it is seen. An
/// Indeterminate from a rule whose effect is `overriding` might have hidden
/// that result, so it outranks any decision of the opposite effect.
fn combine_overrides(
    overriding: Effect,
    ctx: &EvaluationCtx,
    elements: &[CombinerElement],
) -> EvalResult {
    let mut potential_override = false;
    let mut at_least_one_other = false;
    // Later errors are dropped; which Indeterminate wins is arbitrary.
    let mut first_indeterminate: Option<EvalResult> = None;

    for element in elements {
        let child = element.child();
        let result = child.evaluate(ctx);
        let decision = result.decision();

        if decision == overriding.decision() {
            tracing::trace!(
                request = %ctx.request_id,
                rule = child.id(),
                decision = %decision,
                "overriding rule decision"
            );
            return result;
        }

        match decision {
            Decision::Permit | Decision::Deny => at_least_one_other = true,
            Decision::Indeterminate => {
                if child.effect() == Some(overriding) {
                    potential_override = true;
                }
                if first_indeterminate.is_none() {
                    first_indeterminate = Some(result);
                }
            }
            Decision::NotApplicable => {}
        }
    }

    match first_indeterminate {
        Some(indeterminate) if potential_override => indeterminate,
        _ if at_least_one_other => {
            EvalResult::new(overriding.opposite().decision(), ctx.resource_id())
        }
        Some(indeterminate) => indeterminate,
        None => EvalResult::not_applicable(ctx.resource_id()),
    }
}

/// Rule deny-overrides and ordered-deny-overrides
#[derive(Debug, Clone)]
pub struct DenyOverridesRuleAlg {
    id: AlgorithmId,
}

impl DenyOverridesRuleAlg {
    /// XACML 1.0 deny-overrides
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: AlgorithmId::from_static(ids::RULE_DENY_OVERRIDES),
        }
    }

    /// XACML 1.1 ordered-deny-overrides
    #[must_use]
    pub fn ordered() -> Self {
        Self {
            id: AlgorithmId::from_static(ids::RULE_ORDERED_DENY_OVERRIDES),
        }
    }
}

impl Default for DenyOverridesRuleAlg {
    fn default() -> Self {
        Self::new()
    }
}

impl CombiningAlgorithm for DenyOverridesRuleAlg {
    fn identifier(&self) -> &AlgorithmId {
        &self.id
    }

    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Rule
    }

    fn combine(
        &self,
        ctx: &EvaluationCtx,
        _parameters: &[CombinerParameter],
        elements: &[CombinerElement],
    ) -> EvalResult {
        combine_overrides(Effect::Deny, ctx, elements)
    }
}

/// Rule permit-overrides and ordered-permit-overrides
#[derive(Debug, Clone)]
pub struct PermitOverridesRuleAlg {
    id: AlgorithmId,
}

impl PermitOverridesRuleAlg {
    /// XACML 1.0 permit-overrides
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: AlgorithmId::from_static(ids::RULE_PERMIT_OVERRIDES),
        }
    }

    /// XACML 1.1 ordered-permit-overrides
    #[must_use]
    pub fn ordered() -> Self {
        Self {
            id: AlgorithmId::from_static(ids::RULE_ORDERED_PERMIT_OVERRIDES),
        }
    }
}

impl Default for PermitOverridesRuleAlg {
    fn default() -> Self {
        Self::new()
    }
}

impl CombiningAlgorithm for PermitOverridesRuleAlg {
    fn identifier(&self) -> &AlgorithmId {
        &self.id
    }

    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Rule
    }

    fn combine(
        &self,
        ctx: &EvaluationCtx,
        _parameters: &[CombinerParameter],
        elements: &[CombinerElement],
    ) -> EvalResult {
        combine_overrides(Effect::Permit, ctx, elements)
    }
}

/// Rule first-applicable
#[derive(Debug, Clone)]
pub struct FirstApplicableRuleAlg {
    id: AlgorithmId,
}

impl FirstApplicableRuleAlg {
    /// XACML 1.0 first-applicable
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: AlgorithmId::from_static(ids::RULE_FIRST_APPLICABLE),
        }
    }
}

impl Default for FirstApplicableRuleAlg {
    fn default() -> Self {
        Self::new()
    }
}

impl CombiningAlgorithm for FirstApplicableRuleAlg {
    fn identifier(&self) -> &AlgorithmId {
        &self.id
    }

    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Rule
    }

    fn combine(
        &self,
        ctx: &EvaluationCtx,
        _parameters: &[CombinerParameter],
        elements: &[CombinerElement],
    ) -> EvalResult {
        elements
            .iter()
            .map(|element| element.child().evaluate(ctx))
            .find(|result| result.decision() != Decision::NotApplicable)
            .unwrap_or_else(|| EvalResult::not_applicable(ctx.resource_id()))
    }
}
