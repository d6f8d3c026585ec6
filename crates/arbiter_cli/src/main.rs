//! ARBITER CLI
//!
//! Inspect combining-algorithm factories and run scenario files.

#![warn(missing_docs)]
#![warn(clippy::all)]

use arbiter_combine::{CombiningAlgFactory, ConfigStore, FactoryRegistry, Scenario};
use clap::{Parser, Subcommand};
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use console::style;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "arbiter")]
#[command(about = "ARBITER - XACML combining algorithm engine", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List algorithm factories
    Families {
        /// Combining configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// List the algorithms a factory supports
    Algorithms {
        /// Combining configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Factory name; the default factory when omitted
        #[arg(short, long)]
        factory: Option<String>,
    },
    /// Combine the elements of a scenario file
    Combine {
        /// Scenario file
        #[arg(short, long)]
        scenario: PathBuf,
        /// Combining configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Factory name; the default factory when omitted
        #[arg(short, long)]
        factory: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        "arbiter_combine=debug,arbiter_cli=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Standard families, plus the configured factories when a file is given
fn load_registry(config: Option<&Path>) -> Result<FactoryRegistry> {
    match config {
        Some(path) => {
            let store = ConfigStore::load(path)
                .wrap_err_with(|| format!("loading {}", path.display()))?;
            Ok(store.to_registry()?)
        }
        None => Ok(FactoryRegistry::new()),
    }
}

fn select_factory(
    registry: &FactoryRegistry,
    name: Option<&str>,
) -> Result<Arc<dyn CombiningAlgFactory>> {
    match name {
        Some(name) => Ok(registry.factory(name)?),
        None => Ok(registry.default_factory()),
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Families { config } => {
            let registry = load_registry(config.as_deref())?;
            for name in registry.supported_factories() {
                if name == registry.default_name() {
                    println!("{} {}", name, style("(default)").green());
                } else {
                    println!("{}", name);
                }
            }
            Ok(())
        }
        Commands::Algorithms { config, factory } => {
            let registry = load_registry(config.as_deref())?;
            let factory = select_factory(&registry, factory.as_deref())?;
            for id in factory.supported_algorithms() {
                let kind = factory.create_algorithm(id.as_str())?.kind();
                println!("{:<6} {}", style(kind).cyan(), id);
            }
            Ok(())
        }
        Commands::Combine {
            scenario,
            config,
            factory,
        } => {
            let registry = load_registry(config.as_deref())?;
            let factory = select_factory(&registry, factory.as_deref())?;
            let scenario = Scenario::load(&scenario)
                .wrap_err_with(|| format!("loading {}", scenario.display()))?;
            let result = scenario.run(factory.as_ref())?;
            tracing::info!(decision = %result.decision(), "combined");
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter_combine::algorithm::ids;
    use arbiter_core::Decision;
    use std::io::Write;

    #[test]
    fn test_cli_parses_combine() {
        let cli = Cli::try_parse_from([
            "arbiter",
            "--verbose",
            "combine",
            "--scenario",
            "s.json",
            "--factory",
            "strict",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Combine {
                scenario, factory, ..
            } => {
                assert_eq!(scenario, PathBuf::from("s.json"));
                assert_eq!(factory.as_deref(), Some("strict"));
            }
            _ => panic!("expected combine"),
        }
    }

    #[test]
    fn test_cli_requires_scenario() {
        assert!(Cli::try_parse_from(["arbiter", "combine"]).is_err());
    }

    #[test]
    fn test_load_registry_without_config() {
        let registry = load_registry(None).unwrap();
        assert_eq!(registry.supported_factories().len(), 2);
        assert!(select_factory(&registry, Some("missing")).is_err());
    }

    #[test]
    fn test_configured_factory_runs_scenario() {
        let mut config = tempfile::NamedTempFile::new().unwrap();
        write!(
            config,
            "{}",
            serde_json::json!({
                "default_factory": "rules",
                "factories": [{ "name": "rules", "algorithms": [ids::RULE_PERMIT_OVERRIDES] }]
            })
        )
        .unwrap();
        let registry = load_registry(Some(config.path())).unwrap();
        assert_eq!(registry.default_name(), "rules");

        let scenario = Scenario::from_json(
            &serde_json::json!({
                "algorithm": ids::RULE_PERMIT_OVERRIDES,
                "elements": [
                    { "kind": "rule", "id": "r1", "effect": "deny", "decision": "deny" },
                    { "kind": "rule", "id": "r2", "effect": "permit", "decision": "permit" }
                ]
            })
            .to_string(),
        )
        .unwrap();
        let factory = select_factory(&registry, None).unwrap();
        let result = scenario.run(factory.as_ref()).unwrap();
        assert_eq!(result.decision(), Decision::Permit);

        let standard = select_factory(&registry, Some(arbiter_combine::registry::XACML_1_0_IDENTIFIER))
            .unwrap();
        assert_eq!(standard.supported_algorithms().len(), 11);
    }
}
