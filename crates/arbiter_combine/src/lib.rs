//! ARBITER Combining Engine
//!
//! XACML rule- and policy-combining algorithms and the factories that
//! resolve algorithm identifiers to shared instances.
//!
//! Algorithms never fail: child errors arrive as Indeterminate results and
//! are folded into the combined decision. Only registry and configuration
//! lookups return `Err`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithm;
pub mod config;
pub mod element;
pub mod factory;
pub mod policy_alg;
pub mod registry;
pub mod rule_alg;
pub mod scenario;
pub mod scripted;

pub use algorithm::{AlgorithmKind, CombiningAlgorithm};
pub use config::{CombiningConfig, ConfigError, ConfigStore, FactoryConfig};
pub use element::{
    Combinable, CombinerElement, CombinerParameter, ElementKind, MatchResult, Policy, Rule,
};
pub use factory::{BaseAlgorithmFactory, CombiningAlgFactory, StandardAlgorithmFactory};
pub use policy_alg::{
    DenyOverridesPolicyAlg, FirstApplicablePolicyAlg, OnlyOneApplicablePolicyAlg,
    PermitOverridesPolicyAlg,
};
pub use registry::{FactoryRegistry, RegistryError};
pub use rule_alg::{DenyOverridesRuleAlg, FirstApplicableRuleAlg, PermitOverridesRuleAlg};
pub use scenario::{ElementSpec, Scenario, ScenarioError};
pub use scripted::{ScriptedPolicy, ScriptedRule};
