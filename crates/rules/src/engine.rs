//! Start-up wiring: configuration, entity types and the active rule set.

use rulebook_core::config::load_dotenv;
use rulebook_core::{EngineConfig, Record};

use crate::loader::{registry_from_config, Result, RuleSet, RuleStorage};
use crate::reconcile::ConditionEditor;
use crate::registry::EntityTypeRegistry;
use crate::rule::Diff;

/// A registry and the rule set built against it.
///
/// The registry is fixed once the engine exists; rule sets can be reloaded
/// from storage as often as the host likes.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    registry: EntityTypeRegistry,
    rules: RuleSet,
}

impl Engine {
    /// Read `.env` and the environment, then load everything.
    pub fn from_env(storage: &dyn RuleStorage) -> Result<Self> {
        load_dotenv();
        let config = EngineConfig::from_env()?;
        config.log_summary();
        Self::new(config, storage)
    }

    pub fn new(config: EngineConfig, storage: &dyn RuleStorage) -> Result<Self> {
        let registry = registry_from_config(&config)?;
        let rules = RuleSet::load_with_config(storage, &registry, &config)?;
        Ok(Self {
            config,
            registry,
            rules,
        })
    }

    /// Rebuild the rule set from `storage`, keeping the current one if the
    /// load fails.
    pub fn reload(&mut self, storage: &dyn RuleStorage) -> Result<()> {
        self.rules = RuleSet::load_with_config(storage, &self.registry, &self.config)?;
        Ok(())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &EntityTypeRegistry {
        &self.registry
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Condition editor bound to this engine's registry.
    pub fn editor<'a>(&'a self, entity_type: &'a str) -> ConditionEditor<'a> {
        ConditionEditor::new(&self.registry, Some(entity_type))
    }

    pub fn run(&self, entity_type: &str, entity: &Record) -> Diff {
        self.rules.run(entity_type, entity)
    }
}
