//! Configuration store for combining-algorithm factories.
//!
//! A JSON document declares named factories. Each starts either from the
//! standard algorithm set or empty, then adds the algorithms it lists.
//!
//! ```json
//! {
//!   "default_factory": "strict",
//!   "factories": [
//!     {
//!       "name": "strict",
//!       "use_standard_algorithms": false,
//!       "algorithms": [
//!         "urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:deny-overrides"
//!       ]
//!     }
//!   ]
//! }
//! ```

use crate::factory::{BaseAlgorithmFactory, CombiningAlgFactory, StandardAlgorithmFactory};
use crate::registry::{FactoryRegistry, RegistryError, XACML_1_0_IDENTIFIER};
use arbiter_core::AlgorithmId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Error loading or querying the configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid JSON for this schema
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// Two factories share a name
    #[error("more than one combiningAlgFactory with name \"{name}\"")]
    DuplicateFactory {
        /// Conflicting name
        name: String,
    },
    /// A factory lists the same algorithm twice, or one it already has
    #[error("duplicate combining algorithm: {id}")]
    DuplicateAlgorithm {
        /// Conflicting identifier
        id: String,
    },
    /// The default names neither a configured factory nor a known family
    #[error("Unknown combining algorithm factory: {name}")]
    UnknownDefault {
        /// Configured default
        name: String,
    },
    /// Registry lookup failed
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

fn default_factory_name() -> String {
    XACML_1_0_IDENTIFIER.to_string()
}

/// Root configuration document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombiningConfig {
    /// Factory used when none is named
    #[serde(default = "default_factory_name")]
    pub default_factory: String,
    /// Factory declarations
    #[serde(default)]
    pub factories: Vec<FactoryConfig>,
}

impl Default for CombiningConfig {
    fn default() -> Self {
        Self {
            default_factory: default_factory_name(),
            factories: Vec::new(),
        }
    }
}

/// One factory declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryConfig {
    /// Factory name
    pub name: String,
    /// Start from the standard algorithm set
    #[serde(default)]
    pub use_standard_algorithms: bool,
    /// Standard algorithm identifiers to add
    #[serde(default)]
    pub algorithms: Vec<AlgorithmId>,
}

impl FactoryConfig {
    /// Build the factory this declaration describes
    ///
    /// # Errors
    ///
    /// Returns error if an algorithm is unknown or listed twice
    pub fn build(&self) -> Result<BaseAlgorithmFactory, ConfigError> {
        let mut factory = if self.use_standard_algorithms {
            tracing::debug!(factory = %self.name, "starting with standard combining algorithms");
            StandardAlgorithmFactory::new_factory()
        } else {
            BaseAlgorithmFactory::new()
        };

        let catalog = StandardAlgorithmFactory::get_factory();
        for id in &self.algorithms {
            let algorithm = catalog.create_algorithm(id.as_str())?;
            factory.add_algorithm(algorithm).map_err(|err| match err {
                RegistryError::DuplicateRegistration { id } => ConfigError::DuplicateAlgorithm { id },
                other => ConfigError::Registry(other),
            })?;
        }
        Ok(factory)
    }
}

/// Factories loaded from configuration
#[derive(Debug, Clone)]
pub struct ConfigStore {
    factories: IndexMap<String, Arc<dyn CombiningAlgFactory>>,
    default_name: String,
    default_factory: Arc<dyn CombiningAlgFactory>,
}

impl ConfigStore {
    /// Load a configuration file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or the configuration is invalid
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        tracing::info!(path = %path.display(), "loading combining configuration");
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parse a configuration document, resolving the default against the
    /// standard families
    ///
    /// # Errors
    ///
    /// Returns error if the document or configuration is invalid
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: CombiningConfig = serde_json::from_str(text)?;
        Self::from_config(&config, &FactoryRegistry::new())
    }

    /// Build the store from a parsed configuration
    ///
    /// A default that is not configured here is looked up in `families`.
    ///
    /// # Errors
    ///
    /// Returns error if a factory is declared twice, lists a bad algorithm,
    /// or the default cannot be resolved
    pub fn from_config(
        config: &CombiningConfig,
        families: &FactoryRegistry,
    ) -> Result<Self, ConfigError> {
        let mut factories: IndexMap<String, Arc<dyn CombiningAlgFactory>> = IndexMap::new();
        for declared in &config.factories {
            tracing::debug!(factory = %declared.name, "loading combining algorithm factory");
            if factories.contains_key(&declared.name) {
                return Err(ConfigError::DuplicateFactory {
                    name: declared.name.clone(),
                });
            }
            factories.insert(declared.name.clone(), Arc::new(declared.build()?));
        }

        let default_factory = match factories.get(&config.default_factory) {
            Some(factory) => Arc::clone(factory),
            None => families.factory(&config.default_factory).map_err(|_| {
                ConfigError::UnknownDefault {
                    name: config.default_factory.clone(),
                }
            })?,
        };

        tracing::info!(
            factories = factories.len(),
            default = %config.default_factory,
            "combining configuration loaded"
        );
        Ok(Self {
            factories,
            default_name: config.default_factory.clone(),
            default_factory,
        })
    }

    /// The default factory
    #[must_use]
    pub fn default_factory(&self) -> Arc<dyn CombiningAlgFactory> {
        Arc::clone(&self.default_factory)
    }

    /// Name of the default factory
    #[must_use]
    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    /// Look up a configured factory
    ///
    /// # Errors
    ///
    /// Returns error if no factory with that name was configured
    pub fn factory(&self, name: &str) -> Result<Arc<dyn CombiningAlgFactory>, ConfigError> {
        self.factories
            .get(name)
            .map(Arc::clone)
            .ok_or_else(|| {
                ConfigError::Registry(RegistryError::UnknownFactory {
                    name: name.to_string(),
                })
            })
    }

    /// Configured factory names
    #[must_use]
    pub fn supported_factories(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Register every configured factory with `registry`
    ///
    /// Names already in use are skipped with a warning. Returns how many
    /// factories were registered.
    pub fn register_factories(&self, registry: &mut FactoryRegistry) -> usize {
        let mut registered = 0;
        for (name, factory) in &self.factories {
            match registry.register_factory(name.clone(), Arc::clone(factory)) {
                Ok(()) => registered += 1,
                Err(err) => {
                    tracing::warn!(factory = %name, error = %err, "couldn't register factory (already in use)");
                }
            }
        }
        registered
    }

    /// Registry holding the configured factories plus the standard families,
    /// with the configured default selected
    ///
    /// # Errors
    ///
    /// Returns error if the default cannot be selected
    pub fn to_registry(&self) -> Result<FactoryRegistry, ConfigError> {
        let mut registry = FactoryRegistry::new();
        self.register_factories(&mut registry);
        registry.set_default(&self.default_name)?;
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::ids;
    use crate::registry::XACML_2_0_IDENTIFIER;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_standard_default() {
        let store = ConfigStore::from_json("{}").unwrap();
        assert!(store.supported_factories().is_empty());
        assert_eq!(store.default_name(), XACML_1_0_IDENTIFIER);
        assert_eq!(store.default_factory().supported_algorithms().len(), 11);
    }

    #[test]
    fn test_custom_factory_from_scratch() {
        let json = serde_json::json!({
            "default_factory": "strict",
            "factories": [{
                "name": "strict",
                "algorithms": [ids::POLICY_DENY_OVERRIDES, ids::RULE_DENY_OVERRIDES]
            }]
        });
        let store = ConfigStore::from_json(&json.to_string()).unwrap();
        let factory = store.default_factory();
        assert_eq!(factory.supported_algorithms().len(), 2);
        assert!(factory.create_algorithm(ids::POLICY_DENY_OVERRIDES).is_ok());
        assert!(factory.create_algorithm(ids::POLICY_PERMIT_OVERRIDES).is_err());
    }

    #[test]
    fn test_standard_plus_listed_duplicate_fails() {
        let json = serde_json::json!({
            "factories": [{
                "name": "extended",
                "use_standard_algorithms": true,
                "algorithms": [ids::RULE_FIRST_APPLICABLE]
            }]
        });
        let err = ConfigStore::from_json(&json.to_string()).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateAlgorithm { .. }));
        assert!(err.to_string().contains(ids::RULE_FIRST_APPLICABLE));
    }

    #[test]
    fn test_listed_twice_fails() {
        let json = serde_json::json!({
            "factories": [{
                "name": "twice",
                "algorithms": [ids::RULE_FIRST_APPLICABLE, ids::RULE_FIRST_APPLICABLE]
            }]
        });
        let err = ConfigStore::from_json(&json.to_string()).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateAlgorithm { .. }));
    }

    #[test]
    fn test_unknown_algorithm_fails() {
        let json = serde_json::json!({
            "factories": [{ "name": "x", "algorithms": ["urn:example:not-an-algorithm"] }]
        });
        let err = ConfigStore::from_json(&json.to_string()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Registry(RegistryError::UnknownIdentifier { .. })
        ));
    }

    #[test]
    fn test_malformed_algorithm_id_fails() {
        let json = r#"{"factories": [{"name": "x", "algorithms": ["not a uri"]}]}"#;
        let err = ConfigStore::from_json(json).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_duplicate_factory_fails() {
        let json = serde_json::json!({
            "factories": [{ "name": "a" }, { "name": "a" }]
        });
        let err = ConfigStore::from_json(&json.to_string()).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateFactory { .. }));
    }

    #[test]
    fn test_unknown_default_fails() {
        let json = serde_json::json!({ "default_factory": "nowhere" });
        let err = ConfigStore::from_json(&json.to_string()).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDefault { .. }));
    }

    #[test]
    fn test_default_from_family() {
        let json = serde_json::json!({ "default_factory": XACML_2_0_IDENTIFIER });
        let store = ConfigStore::from_json(&json.to_string()).unwrap();
        assert_eq!(store.default_factory().supported_algorithms().len(), 11);
    }

    #[test]
    fn test_factory_lookup() {
        let json = serde_json::json!({
            "factories": [{ "name": "a", "use_standard_algorithms": true }]
        });
        let store = ConfigStore::from_json(&json.to_string()).unwrap();
        assert!(store.factory("a").is_ok());
        assert!(matches!(
            store.factory("b"),
            Err(ConfigError::Registry(RegistryError::UnknownFactory { .. }))
        ));
    }

    #[test]
    fn test_register_factories_skips_taken_names() {
        let json = serde_json::json!({
            "factories": [
                { "name": XACML_1_0_IDENTIFIER },
                { "name": "fresh", "use_standard_algorithms": true }
            ]
        });
        let store = ConfigStore::from_json(&json.to_string()).unwrap();
        let mut registry = FactoryRegistry::new();
        let registered = store.register_factories(&mut registry);
        assert_eq!(registered, 1);
        assert!(registry.contains("fresh"));
        // The standard family keeps its first binding.
        assert_eq!(
            registry
                .factory(XACML_1_0_IDENTIFIER)
                .unwrap()
                .supported_algorithms()
                .len(),
            11
        );
    }

    #[test]
    fn test_to_registry_selects_default() {
        let json = serde_json::json!({
            "default_factory": "mine",
            "factories": [{ "name": "mine", "algorithms": [ids::RULE_FIRST_APPLICABLE] }]
        });
        let store = ConfigStore::from_json(&json.to_string()).unwrap();
        let registry = store.to_registry().unwrap();
        assert_eq!(registry.default_name(), "mine");
        assert_eq!(registry.supported_factories().len(), 3);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            serde_json::json!({
                "factories": [{ "name": "file", "algorithms": [ids::POLICY_ONLY_ONE_APPLICABLE] }]
            })
        )
        .unwrap();
        let store = ConfigStore::load(file.path()).unwrap();
        assert_eq!(store.supported_factories(), vec!["file".to_string()]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ConfigStore::load(Path::new("/nonexistent/arbiter.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
