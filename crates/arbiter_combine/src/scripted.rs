//! Scripted rules and policies with fixed outcomes.
//!
//! Stand-ins for real policy evaluation, used by scenario files and tests.
//! Each keeps call counters so short-circuiting can be observed.

use crate::element::{MatchResult, Policy, Rule};
use arbiter_core::{Decision, Effect, EvalResult, EvaluationCtx, Obligation, Status};
use std::sync::atomic::{AtomicUsize, Ordering};

fn scripted_outcome(decision: Decision) -> EvalResult {
    match decision {
        Decision::Indeterminate => {
            EvalResult::indeterminate(Status::processing_error("scripted failure"), None)
        }
        other => EvalResult::new(other, None),
    }
}

/// Rule that always evaluates to the same result
#[derive(Debug)]
pub struct ScriptedRule {
    id: String,
    effect: Effect,
    outcome: EvalResult,
    evaluations: AtomicUsize,
}

impl ScriptedRule {
    /// Create a rule evaluating to `decision`
    #[must_use]
    pub fn new(id: impl Into<String>, effect: Effect, decision: Decision) -> Self {
        Self::with_outcome(id, effect, scripted_outcome(decision))
    }

    /// Create a rule evaluating to a prepared result
    #[must_use]
    pub fn with_outcome(id: impl Into<String>, effect: Effect, outcome: EvalResult) -> Self {
        Self {
            id: id.into(),
            effect,
            outcome,
            evaluations: AtomicUsize::new(0),
        }
    }

    /// Number of times `evaluate` was called
    #[must_use]
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }
}

impl Rule for ScriptedRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn effect(&self) -> Effect {
        self.effect
    }

    fn evaluate(&self, _ctx: &EvaluationCtx) -> EvalResult {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        self.outcome.clone()
    }
}

/// Policy with a fixed target match and a fixed evaluation result
#[derive(Debug)]
pub struct ScriptedPolicy {
    id: String,
    target: MatchResult,
    outcome: EvalResult,
    matches: AtomicUsize,
    evaluations: AtomicUsize,
}

impl ScriptedPolicy {
    /// Create a policy evaluating to `decision`
    #[must_use]
    pub fn new(id: impl Into<String>, target: MatchResult, decision: Decision) -> Self {
        Self::with_outcome(id, target, scripted_outcome(decision))
    }

    /// Create a policy evaluating to a prepared result
    #[must_use]
    pub fn with_outcome(id: impl Into<String>, target: MatchResult, outcome: EvalResult) -> Self {
        Self {
            id: id.into(),
            target,
            outcome,
            matches: AtomicUsize::new(0),
            evaluations: AtomicUsize::new(0),
        }
    }

    /// Create a matching policy whose result carries obligations
    #[must_use]
    pub fn with_obligations(
        id: impl Into<String>,
        decision: Decision,
        obligations: Vec<Obligation>,
    ) -> Self {
        let outcome = scripted_outcome(decision).with_obligations(obligations);
        Self::with_outcome(id, MatchResult::Match, outcome)
    }

    /// Number of times `match_target` was called
    #[must_use]
    pub fn matches(&self) -> usize {
        self.matches.load(Ordering::Relaxed)
    }

    /// Number of times `evaluate` was called
    #[must_use]
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }
}

impl Policy for ScriptedPolicy {
    fn id(&self) -> &str {
        &self.id
    }

    fn match_target(&self, _ctx: &EvaluationCtx) -> MatchResult {
        self.matches.fetch_add(1, Ordering::Relaxed);
        self.target.clone()
    }

    fn evaluate(&self, _ctx: &EvaluationCtx) -> EvalResult {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        self.outcome.clone()
    }
}
