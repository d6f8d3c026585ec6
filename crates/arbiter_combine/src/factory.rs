//! Algorithm factories: identifier → shared algorithm instance.

use crate::algorithm::CombiningAlgorithm;
use crate::policy_alg::{
    DenyOverridesPolicyAlg, FirstApplicablePolicyAlg, OnlyOneApplicablePolicyAlg,
    PermitOverridesPolicyAlg,
};
use crate::registry::RegistryError;
use crate::rule_alg::{DenyOverridesRuleAlg, FirstApplicableRuleAlg, PermitOverridesRuleAlg};
use arbiter_core::AlgorithmId;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::Arc;

/// Resolves algorithm identifiers
///
/// Lookups take `&self` and are safe to share between threads. Adding
/// takes `&mut self`, so a factory can only grow before it is shared.
pub trait CombiningAlgFactory: Send + Sync + fmt::Debug {
    /// Register an algorithm under its own identifier
    ///
    /// # Errors
    ///
    /// Returns error if the identifier is taken or the factory is immutable
    fn add_algorithm(&mut self, algorithm: Arc<dyn CombiningAlgorithm>)
        -> Result<(), RegistryError>;

    /// Identifiers in registration order
    fn supported_algorithms(&self) -> Vec<AlgorithmId>;

    /// Look up an algorithm
    ///
    /// # Errors
    ///
    /// Returns error if the identifier is not registered
    fn create_algorithm(&self, id: &str) -> Result<Arc<dyn CombiningAlgorithm>, RegistryError>;
}

/// Mutable factory backed by an ordered map
#[derive(Debug, Clone, Default)]
pub struct BaseAlgorithmFactory {
    algorithms: IndexMap<AlgorithmId, Arc<dyn CombiningAlgorithm>>,
}

impl BaseAlgorithmFactory {
    /// Create an empty factory
    #[must_use]
    pub fn new() -> Self {
        Self {
            algorithms: IndexMap::new(),
        }
    }

    /// Create a factory holding the given algorithms
    ///
    /// # Errors
    ///
    /// Returns error if two algorithms share an identifier
    pub fn with_algorithms(
        algorithms: impl IntoIterator<Item = Arc<dyn CombiningAlgorithm>>,
    ) -> Result<Self, RegistryError> {
        let mut factory = Self::new();
        for algorithm in algorithms {
            factory.add_algorithm(algorithm)?;
        }
        Ok(factory)
    }

    /// Number of registered algorithms
    #[must_use]
    pub fn len(&self) -> usize {
        self.algorithms.len()
    }

    /// Check if the factory is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }
}

impl CombiningAlgFactory for BaseAlgorithmFactory {
    fn add_algorithm(
        &mut self,
        algorithm: Arc<dyn CombiningAlgorithm>,
    ) -> Result<(), RegistryError> {
        let id = algorithm.identifier().clone();
        if self.algorithms.contains_key(&id) {
            return Err(RegistryError::DuplicateRegistration { id: id.to_string() });
        }
        tracing::debug!(algorithm = %id, kind = %algorithm.kind(), "registered combining algorithm");
        self.algorithms.insert(id, algorithm);
        Ok(())
    }

    fn supported_algorithms(&self) -> Vec<AlgorithmId> {
        self.algorithms.keys().cloned().collect()
    }

    fn create_algorithm(&self, id: &str) -> Result<Arc<dyn CombiningAlgorithm>, RegistryError> {
        self.algorithms
            .get(id)
            .map(Arc::clone)
            .ok_or_else(|| RegistryError::UnknownIdentifier { id: id.to_string() })
    }
}

/// The eleven XACML 1.x standard algorithms, in identifier-table order
fn standard_algorithms() -> Vec<Arc<dyn CombiningAlgorithm>> {
    vec![
        Arc::new(DenyOverridesRuleAlg::new()),
        Arc::new(DenyOverridesRuleAlg::ordered()),
        Arc::new(PermitOverridesRuleAlg::new()),
        Arc::new(PermitOverridesRuleAlg::ordered()),
        Arc::new(FirstApplicableRuleAlg::new()),
        Arc::new(DenyOverridesPolicyAlg::new()),
        Arc::new(DenyOverridesPolicyAlg::ordered()),
        Arc::new(PermitOverridesPolicyAlg::new()),
        Arc::new(PermitOverridesPolicyAlg::ordered()),
        Arc::new(FirstApplicablePolicyAlg::new()),
        Arc::new(OnlyOneApplicablePolicyAlg::new()),
    ]
}

static STANDARD: Lazy<BaseAlgorithmFactory> = Lazy::new(|| {
    tracing::debug!("initializing standard combining algorithms");
    // The `ids` constants are pairwise distinct.
    let factory = BaseAlgorithmFactory::with_algorithms(standard_algorithms());
    debug_assert!(factory.is_ok(), "standard algorithm identifiers collide");
    factory.unwrap_or_default()
});

/// Handle to the process-wide standard factory
///
/// The backing set is built once, on first use, and never changes; every
/// `add_algorithm` call is rejected. Use [`StandardAlgorithmFactory::new_factory`]
/// for an extensible copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardAlgorithmFactory;

impl StandardAlgorithmFactory {
    /// Handle to the shared standard factory
    #[must_use]
    pub fn get_factory() -> Self {
        Lazy::force(&STANDARD);
        Self
    }

    /// Mutable factory seeded with the standard algorithms
    #[must_use]
    pub fn new_factory() -> BaseAlgorithmFactory {
        (*STANDARD).clone()
    }

    /// Identifiers of the standard algorithms
    #[must_use]
    pub fn standard_identifiers() -> Vec<AlgorithmId> {
        STANDARD.supported_algorithms()
    }
}

impl CombiningAlgFactory for StandardAlgorithmFactory {
    fn add_algorithm(
        &mut self,
        algorithm: Arc<dyn CombiningAlgorithm>,
    ) -> Result<(), RegistryError> {
        Err(RegistryError::ImmutableFactory {
            id: algorithm.identifier().to_string(),
        })
    }

    fn supported_algorithms(&self) -> Vec<AlgorithmId> {
        STANDARD.supported_algorithms()
    }

    fn create_algorithm(&self, id: &str) -> Result<Arc<dyn CombiningAlgorithm>, RegistryError> {
        STANDARD.create_algorithm(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::{ids, AlgorithmKind};
    use crate::element::{CombinerElement, CombinerParameter};
    use arbiter_core::{Decision, EvalResult, EvaluationCtx};

    #[derive(Debug)]
    struct AlwaysPermit {
        id: AlgorithmId,
    }

    impl AlwaysPermit {
        fn new(id: &str) -> Self {
            Self {
                id: AlgorithmId::parse(id).unwrap(),
            }
        }
    }

    impl CombiningAlgorithm for AlwaysPermit {
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
            _elements: &[CombinerElement],
        ) -> EvalResult {
            EvalResult::new(Decision::Permit, ctx.resource_id())
        }
    }

    #[test]
    fn test_base_factory_add_and_create() {
        let mut factory = BaseAlgorithmFactory::new();
        assert!(factory.is_empty());
        factory
            .add_algorithm(Arc::new(AlwaysPermit::new("urn:example:x")))
            .unwrap();
        assert_eq!(factory.len(), 1);

        let alg = factory.create_algorithm("urn:example:x").unwrap();
        assert_eq!(alg.identifier().as_str(), "urn:example:x");
    }

    #[test]
    fn test_base_factory_duplicate() {
        let mut factory = BaseAlgorithmFactory::new();
        factory
            .add_algorithm(Arc::new(AlwaysPermit::new("urn:example:x")))
            .unwrap();
        let err = factory
            .add_algorithm(Arc::new(AlwaysPermit::new("urn:example:x")))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateRegistration {
                id: "urn:example:x".to_string()
            }
        );
    }

    #[test]
    fn test_base_factory_unknown() {
        let factory = BaseAlgorithmFactory::new();
        let err = factory.create_algorithm("urn:example:missing").unwrap_err();
        assert!(matches!(err, RegistryError::UnknownIdentifier { .. }));
    }

    #[test]
    fn test_with_algorithms_rejects_duplicates() {
        let result = BaseAlgorithmFactory::with_algorithms(vec![
            Arc::new(AlwaysPermit::new("urn:example:x")) as Arc<dyn CombiningAlgorithm>,
            Arc::new(AlwaysPermit::new("urn:example:x")),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_standard_factory_contents() {
        let factory = StandardAlgorithmFactory::get_factory();
        let supported = factory.supported_algorithms();
        assert_eq!(supported.len(), 11);
        assert_eq!(supported[0].as_str(), ids::RULE_DENY_OVERRIDES);
        for id in [
            ids::RULE_ORDERED_PERMIT_OVERRIDES,
            ids::RULE_FIRST_APPLICABLE,
            ids::POLICY_ONLY_ONE_APPLICABLE,
            ids::POLICY_ORDERED_DENY_OVERRIDES,
        ] {
            let alg = factory.create_algorithm(id).unwrap();
            assert_eq!(alg.identifier().as_str(), id);
        }
    }

    #[test]
    fn test_standard_identifiers_distinct() {
        let factory = BaseAlgorithmFactory::with_algorithms(standard_algorithms()).unwrap();
        assert_eq!(factory.len(), standard_algorithms().len());
        assert_eq!(
            StandardAlgorithmFactory::standard_identifiers(),
            factory.supported_algorithms()
        );
    }

    #[test]
    fn test_standard_factory_kinds() {
        let factory = StandardAlgorithmFactory::get_factory();
        let rule = factory.create_algorithm(ids::RULE_DENY_OVERRIDES).unwrap();
        let policy = factory.create_algorithm(ids::POLICY_DENY_OVERRIDES).unwrap();
        assert_eq!(rule.kind(), AlgorithmKind::Rule);
        assert_eq!(policy.kind(), AlgorithmKind::Policy);
    }

    #[test]
    fn test_standard_factory_rejects_add() {
        let mut factory = StandardAlgorithmFactory::get_factory();
        let err = factory
            .add_algorithm(Arc::new(AlwaysPermit::new("urn:example:new")))
            .unwrap_err();
        assert!(matches!(err, RegistryError::ImmutableFactory { .. }));

        // Even a standard identifier is refused.
        let err = factory
            .add_algorithm(Arc::new(DenyOverridesRuleAlg::new()))
            .unwrap_err();
        assert!(matches!(err, RegistryError::ImmutableFactory { .. }));
        assert_eq!(factory.supported_algorithms().len(), 11);
    }

    #[test]
    fn test_new_factory_is_independent_copy() {
        let mut copy = StandardAlgorithmFactory::new_factory();
        copy.add_algorithm(Arc::new(AlwaysPermit::new("urn:example:extra")))
            .unwrap();
        assert_eq!(copy.len(), 12);
        assert_eq!(StandardAlgorithmFactory::standard_identifiers().len(), 11);

        let err = copy
            .add_algorithm(Arc::new(FirstApplicableRuleAlg::new()))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateRegistration { .. }));
    }

    #[test]
    fn test_shared_lookup_across_threads() {
        let factory = StandardAlgorithmFactory::get_factory();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(move || {
                    factory
                        .create_algorithm(ids::POLICY_PERMIT_OVERRIDES)
                        .map(|alg| alg.identifier().clone())
                })
            })
            .collect();
        for handle in handles {
            let id = handle.join().unwrap().unwrap();
            assert_eq!(id.as_str(), ids::POLICY_PERMIT_OVERRIDES);
        }
    }
}
