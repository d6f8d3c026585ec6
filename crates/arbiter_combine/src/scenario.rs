//! Scenario files: an algorithm plus children with fixed outcomes.
//!
//! Used by the `arbiter combine` command to exercise an algorithm without
//! a policy evaluator.

use crate::element::{Combinable, CombinerElement, CombinerParameter, ElementKind, MatchResult};
use crate::factory::CombiningAlgFactory;
use crate::registry::RegistryError;
use crate::scripted::{ScriptedPolicy, ScriptedRule};
use arbiter_core::{
    AlgorithmId, Decision, Effect, EvalResult, EvaluationCtx, Obligation, Status,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Error loading or running a scenario
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// The document is not a valid scenario
    #[error("invalid scenario: {0}")]
    Json(#[from] serde_json::Error),
    /// A rule element has no effect
    #[error("rule {id} has no effect")]
    MissingEffect {
        /// Rule identifier
        id: String,
    },
    /// The algorithm could not be resolved
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// One child element with a fixed outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSpec {
    /// Element kind
    pub kind: ElementKind,
    /// Element identifier
    pub id: String,
    /// Rule effect; required for rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<Effect>,
    /// Target match for policies; ignored for rules
    #[serde(default, rename = "match")]
    pub target: MatchResult,
    /// Evaluation decision
    pub decision: Decision,
    /// Evaluation status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    /// Obligations on the evaluation result
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub obligations: Vec<Obligation>,
    /// Parameters bound to this element
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<CombinerParameter>,
}

impl ElementSpec {
    fn outcome(&self) -> EvalResult {
        let status = match (&self.status, self.decision) {
            (Some(status), _) => Some(status.clone()),
            (None, Decision::Indeterminate) => Some(Status::processing_error("scripted failure")),
            (None, _) => None,
        };
        let result = EvalResult::new(self.decision, None);
        let result = match status {
            Some(status) => result.with_status(status),
            None => result,
        };
        result.with_obligations(self.obligations.iter().cloned())
    }

    /// Build the combiner element this entry describes
    ///
    /// # Errors
    ///
    /// Returns error if a rule has no effect
    pub fn to_element(&self) -> Result<CombinerElement, ScenarioError> {
        let child = match self.kind {
            ElementKind::Rule => {
                let effect = self.effect.ok_or_else(|| ScenarioError::MissingEffect {
                    id: self.id.clone(),
                })?;
                Combinable::Rule(Arc::new(ScriptedRule::with_outcome(
                    self.id.clone(),
                    effect,
                    self.outcome(),
                )))
            }
            kind => {
                let policy = Arc::new(ScriptedPolicy::with_outcome(
                    self.id.clone(),
                    self.target.clone(),
                    self.outcome(),
                ));
                match kind {
                    ElementKind::PolicySet => Combinable::PolicySet(policy),
                    ElementKind::Reference => Combinable::Reference(policy),
                    _ => Combinable::Policy(policy),
                }
            }
        };
        Ok(CombinerElement::with_parameters(
            child,
            self.parameters.clone(),
        ))
    }
}

/// An algorithm applied to scripted children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Combining algorithm identifier
    pub algorithm: AlgorithmId,
    /// Resource the request is about
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    /// Algorithm-level parameters
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<CombinerParameter>,
    /// Children in document order
    #[serde(default)]
    pub elements: Vec<ElementSpec>,
}

impl Scenario {
    /// Parse a scenario document
    ///
    /// # Errors
    ///
    /// Returns error if the document is not a valid scenario
    pub fn from_json(text: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a scenario file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let text = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Build the children
    ///
    /// # Errors
    ///
    /// Returns error if an element is malformed
    pub fn elements(&self) -> Result<Vec<CombinerElement>, ScenarioError> {
        self.elements.iter().map(ElementSpec::to_element).collect()
    }

    /// Resolve the algorithm in `factory` and combine the children
    ///
    /// # Errors
    ///
    /// Returns error if the algorithm is unknown or an element is malformed
    pub fn run(&self, factory: &dyn CombiningAlgFactory) -> Result<EvalResult, ScenarioError> {
        let algorithm = factory.create_algorithm(self.algorithm.as_str())?;
        let elements = self.elements()?;
        let ctx = match &self.resource_id {
            Some(resource) => EvaluationCtx::new().with_resource(resource.clone()),
            None => EvaluationCtx::new(),
        };
        tracing::debug!(
            algorithm = %self.algorithm,
            elements = elements.len(),
            request = %ctx.request_id,
            "running scenario"
        );
        Ok(algorithm.combine(&ctx, &self.parameters, &elements))
    }
}
