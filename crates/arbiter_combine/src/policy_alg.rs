//! Policy-combining algorithms.
//!
//! Every child is matched before it is evaluated. Obligations on the
//! combined result are filtered to those whose fulfill-on effect equals the
//! final decision, so NotApplicable and Indeterminate never carry any.

use crate::algorithm::{ids, AlgorithmKind, CombiningAlgorithm};
use crate::element::{CombinerElement, CombinerParameter, MatchResult};
use arbiter_core::{AlgorithmId, Decision, EvalResult, EvaluationCtx, Obligation, Status};
use indexmap::IndexSet;

/// Message on the status returned when several policies apply
pub const TOO_MANY_APPLICABLE: &str = "Too many applicable policies";

/// Policy deny-overrides and ordered-deny-overrides
///
/// Fails closed: an Indeterminate match or evaluation yields Deny without
/// obligations.
#[derive(Debug, Clone)]
pub struct DenyOverridesPolicyAlg {
    id: AlgorithmId,
}

impl DenyOverridesPolicyAlg {
    /// XACML 1.0 deny-overrides
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: AlgorithmId::from_static(ids::POLICY_DENY_OVERRIDES),
        }
    }

    /// XACML 1.1 ordered-deny-overrides
    #[must_use]
    pub fn ordered() -> Self {
        Self {
            id: AlgorithmId::from_static(ids::POLICY_ORDERED_DENY_OVERRIDES),
        }
    }
}

impl Default for DenyOverridesPolicyAlg {
    fn default() -> Self {
        Self::new()
    }
}

impl CombiningAlgorithm for DenyOverridesPolicyAlg {
    fn identifier(&self) -> &AlgorithmId {
        &self.id
    }

    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Policy
    }

    fn combine(
        &self,
        ctx: &EvaluationCtx,
        _parameters: &[CombinerParameter],
        elements: &[CombinerElement],
    ) -> EvalResult {
        let mut at_least_one_permit = false;
        let mut permit_obligations: IndexSet<Obligation> = IndexSet::new();

        for element in elements {
            let child = element.child();
            match child.match_target(ctx) {
                MatchResult::Match => {}
                MatchResult::NoMatch => continue,
                MatchResult::Indeterminate { .. } => {
                    tracing::debug!(
                        request = %ctx.request_id,
                        policy = child.id(),
                        "target indeterminate, denying"
                    );
                    return EvalResult::new(Decision::Deny, ctx.resource_id());
                }
            }

            let result = child.evaluate(ctx);
            match result.decision() {
                decision @ (Decision::Deny | Decision::Indeterminate) => {
                    tracing::debug!(
                        request = %ctx.request_id,
                        policy = child.id(),
                        decision = %decision,
                        "denying"
                    );
                    return EvalResult::new(Decision::Deny, ctx.resource_id())
                        .with_obligations(result.into_obligations())
                        .retain_fulfilled();
                }
                Decision::Permit => {
                    at_least_one_permit = true;
                    permit_obligations.extend(result.into_obligations());
                }
                Decision::NotApplicable => {}
            }
        }

        if at_least_one_permit {
            EvalResult::new(Decision::Permit, ctx.resource_id())
                .with_obligations(permit_obligations)
                .retain_fulfilled()
        } else {
            EvalResult::not_applicable(ctx.resource_id())
        }
    }
}

/// Policy permit-overrides and ordered-permit-overrides
#[derive(Debug, Clone)]
pub struct PermitOverridesPolicyAlg {
    id: AlgorithmId,
}

impl PermitOverridesPolicyAlg {
    /// XACML 1.0 permit-overrides
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: AlgorithmId::from_static(ids::POLICY_PERMIT_OVERRIDES),
        }
    }

    /// XACML 1.1 ordered-permit-overrides
    #[must_use]
    pub fn ordered() -> Self {
        Self {
            id: AlgorithmId::from_static(ids::POLICY_ORDERED_PERMIT_OVERRIDES),
        }
    }
}

impl Default for PermitOverridesPolicyAlg {
    fn default() -> Self {
        Self::new()
    }
}

impl CombiningAlgorithm for PermitOverridesPolicyAlg {
    fn identifier(&self) -> &AlgorithmId {
        &self.id
    }

    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Policy
    }

    fn combine(
        &self,
        ctx: &EvaluationCtx,
        _parameters: &[CombinerParameter],
        elements: &[CombinerElement],
    ) -> EvalResult {
        let mut at_least_one_error = false;
        let mut at_least_one_deny = false;
        let mut deny_obligations: IndexSet<Obligation> = IndexSet::new();
        let mut first_indeterminate_status: Option<Status> = None;

        for element in elements {
            let child = element.child();
            match child.match_target(ctx) {
                MatchResult::Match => {}
                MatchResult::NoMatch => continue,
                MatchResult::Indeterminate { status } => {
                    at_least_one_error = true;
                    if first_indeterminate_status.is_none() {
                        first_indeterminate_status = Some(status);
                    }
                    continue;
                }
            }

            let result = child.evaluate(ctx);
            match result.decision() {
                Decision::Permit => return result.retain_fulfilled(),
                Decision::Deny => {
                    at_least_one_deny = true;
                    deny_obligations.extend(result.into_obligations());
                }
                Decision::Indeterminate => {
                    at_least_one_error = true;
                    if first_indeterminate_status.is_none() {
                        first_indeterminate_status = result.status().cloned();
                    }
                }
                Decision::NotApplicable => {}
            }
        }

        if at_least_one_deny {
            return EvalResult::new(Decision::Deny, ctx.resource_id())
                .with_obligations(deny_obligations)
                .retain_fulfilled();
        }
        if at_least_one_error {
            let result = EvalResult::new(Decision::Indeterminate, ctx.resource_id());
            return match first_indeterminate_status {
                Some(status) => result.with_status(status),
                None => result,
            };
        }
        EvalResult::not_applicable(ctx.resource_id())
    }
}

/// Policy first-applicable
#[derive(Debug, Clone)]
pub struct FirstApplicablePolicyAlg {
    id: AlgorithmId,
}

impl FirstApplicablePolicyAlg {
    /// XACML 1.0 first-applicable
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: AlgorithmId::from_static(ids::POLICY_FIRST_APPLICABLE),
        }
    }
}

impl Default for FirstApplicablePolicyAlg {
    fn default() -> Self {
        Self::new()
    }
}

impl CombiningAlgorithm for FirstApplicablePolicyAlg {
    fn identifier(&self) -> &AlgorithmId {
        &self.id
    }

    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Policy
    }

    fn combine(
        &self,
        ctx: &EvaluationCtx,
        _parameters: &[CombinerParameter],
        elements: &[CombinerElement],
    ) -> EvalResult {
        for element in elements {
            let child = element.child();
            match child.match_target(ctx) {
                MatchResult::Match => {}
                MatchResult::NoMatch => continue,
                MatchResult::Indeterminate { status } => {
                    return EvalResult::indeterminate(status, ctx.resource_id());
                }
            }

            let result = child.evaluate(ctx);
            if result.decision() != Decision::NotApplicable {
                return result.retain_fulfilled();
            }
        }

        EvalResult::not_applicable(ctx.resource_id())
    }
}

/// Policy only-one-applicable
///
/// All targets are matched before anything is evaluated; exactly one
/// applicable policy is evaluated and its result returned.
#[derive(Debug, Clone)]
pub struct OnlyOneApplicablePolicyAlg {
    id: AlgorithmId,
}

impl OnlyOneApplicablePolicyAlg {
    /// XACML 1.0 only-one-applicable
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: AlgorithmId::from_static(ids::POLICY_ONLY_ONE_APPLICABLE),
        }
    }
}

impl Default for OnlyOneApplicablePolicyAlg {
    fn default() -> Self {
        Self::new()
    }
}

impl CombiningAlgorithm for OnlyOneApplicablePolicyAlg {
    fn identifier(&self) -> &AlgorithmId {
        &self.id
    }

    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Policy
    }

    fn combine(
        &self,
        ctx: &EvaluationCtx,
        _parameters: &[CombinerParameter],
        elements: &[CombinerElement],
    ) -> EvalResult {
        let mut selected: Option<&CombinerElement> = None;

        for element in elements {
            match element.child().match_target(ctx) {
                MatchResult::NoMatch => {}
                MatchResult::Indeterminate { status } => {
                    return EvalResult::indeterminate(status, ctx.resource_id());
                }
                MatchResult::Match => {
                    if selected.is_some() {
                        tracing::debug!(
                            request = %ctx.request_id,
                            policy = element.child().id(),
                            "second applicable policy"
                        );
                        return EvalResult::indeterminate(
                            Status::processing_error(TOO_MANY_APPLICABLE),
                            ctx.resource_id(),
                        );
                    }
                    selected = Some(element);
                }
            }
        }

        match selected {
            Some(element) => element.child().evaluate(ctx).retain_fulfilled(),
            None => EvalResult::not_applicable(ctx.resource_id()),
        }
    }
}
