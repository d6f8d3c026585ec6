//! Registry of algorithm families.
//!
//! Each family is a factory registered under a string key, typically the
//! identifier of the XACML version whose algorithms it supplies. The
//! registry is an ordinary value: build it during setup, then share it
//! read-only.

use crate::algorithm::CombiningAlgorithm;
use crate::factory::{CombiningAlgFactory, StandardAlgorithmFactory};
use arbiter_core::CoreError;
use indexmap::IndexMap;
use std::sync::Arc;

/// XACML 1.0 policy namespace; the default family
pub const XACML_1_0_IDENTIFIER: &str = "urn:oasis:names:tc:xacml:1.0:policy";

/// XACML 2.0 policy namespace
pub const XACML_2_0_IDENTIFIER: &str = "urn:oasis:names:tc:xacml:2.0:policy:schema:os";

/// Error from factory or registry operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No algorithm under this identifier
    #[error("unknown combining algorithm: {id}")]
    UnknownIdentifier {
        /// Requested identifier
        id: String,
    },
    /// Identifier already registered
    #[error("duplicate combining algorithm: {id}")]
    DuplicateRegistration {
        /// Conflicting identifier
        id: String,
    },
    /// The standard factory cannot be extended
    #[error("cannot add {id}: the standard factory is immutable")]
    ImmutableFactory {
        /// Identifier that was rejected
        id: String,
    },
    /// No factory under this name
    #[error("unknown combining algorithm factory: {name}")]
    UnknownFactory {
        /// Requested name
        name: String,
    },
    /// Factory name already registered
    #[error("combining algorithm factory already registered: {name}")]
    DuplicateFactory {
        /// Conflicting name
        name: String,
    },
}

impl From<RegistryError> for CoreError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownIdentifier { id } => CoreError::NotFound {
                kind: "Combining algorithm".to_string(),
                id,
            },
            RegistryError::DuplicateRegistration { id } => CoreError::AlreadyExists {
                kind: "Combining algorithm".to_string(),
                id,
            },
            RegistryError::ImmutableFactory { id } => CoreError::Unsupported {
                operation: format!("add {} to the standard factory", id),
            },
            RegistryError::UnknownFactory { name } => CoreError::NotFound {
                kind: "Combining algorithm factory".to_string(),
                id: name,
            },
            RegistryError::DuplicateFactory { name } => CoreError::AlreadyExists {
                kind: "Combining algorithm factory".to_string(),
                id: name,
            },
        }
    }
}

/// Named algorithm factories with a selected default
#[derive(Debug, Clone)]
pub struct FactoryRegistry {
    factories: IndexMap<String, Arc<dyn CombiningAlgFactory>>,
    default_name: String,
    default_factory: Arc<dyn CombiningAlgFactory>,
}

impl FactoryRegistry {
    /// Registry with the XACML 1.0 and 2.0 families, both bound to the
    /// standard factory; 1.0 is the default
    #[must_use]
    pub fn new() -> Self {
        let standard: Arc<dyn CombiningAlgFactory> =
            Arc::new(StandardAlgorithmFactory::get_factory());
        let mut factories = IndexMap::new();
        factories.insert(XACML_1_0_IDENTIFIER.to_string(), Arc::clone(&standard));
        factories.insert(XACML_2_0_IDENTIFIER.to_string(), Arc::clone(&standard));
        Self {
            factories,
            default_name: XACML_1_0_IDENTIFIER.to_string(),
            default_factory: standard,
        }
    }

    /// Registry holding a single factory, which is the default
    #[must_use]
    pub fn with_default(name: impl Into<String>, factory: Arc<dyn CombiningAlgFactory>) -> Self {
        let name = name.into();
        let mut factories = IndexMap::new();
        factories.insert(name.clone(), Arc::clone(&factory));
        Self {
            factories,
            default_name: name,
            default_factory: factory,
        }
    }

    /// Register a factory under a name
    ///
    /// # Errors
    ///
    /// Returns error if the name is already in use
    pub fn register_factory(
        &mut self,
        name: impl Into<String>,
        factory: Arc<dyn CombiningAlgFactory>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(RegistryError::DuplicateFactory { name });
        }
        tracing::debug!(factory = %name, "registered combining algorithm factory");
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Select the default family
    ///
    /// # Errors
    ///
    /// Returns error if no factory has that name
    pub fn set_default(&mut self, name: &str) -> Result<(), RegistryError> {
        self.default_factory = self.factory(name)?;
        self.default_name = name.to_string();
        Ok(())
    }

    /// Name of the default family
    #[must_use]
    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    /// The default factory
    #[must_use]
    pub fn default_factory(&self) -> Arc<dyn CombiningAlgFactory> {
        Arc::clone(&self.default_factory)
    }

    /// Look up a factory by name
    ///
    /// # Errors
    ///
    /// Returns error if no factory has that name
    pub fn factory(&self, name: &str) -> Result<Arc<dyn CombiningAlgFactory>, RegistryError> {
        self.factories
            .get(name)
            .map(Arc::clone)
            .ok_or_else(|| RegistryError::UnknownFactory {
                name: name.to_string(),
            })
    }

    /// Check if a factory name is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names in registration order
    #[must_use]
    pub fn supported_factories(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Look up an algorithm in the default family
    ///
    /// # Errors
    ///
    /// Returns error if the default family does not know the identifier
    pub fn create_algorithm(&self, id: &str) -> Result<Arc<dyn CombiningAlgorithm>, RegistryError> {
        self.default_factory().create_algorithm(id)
    }
}

impl Default for FactoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}
