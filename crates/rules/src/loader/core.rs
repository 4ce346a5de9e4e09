//! Active rule set: stored records turned into validated, ordered rules.

use rulebook_core::{EngineConfig, Record};
use tracing::{info, warn};

use super::error::{LoadError, LoadStatus, Result, RuleLoadReport};
use super::storage::RuleStorage;
use crate::condition::EvalOptions;
use crate::registry::EntityTypeRegistry;
use crate::rule::{Diff, Rule, Stage};

/// How a rule set load treats invalid rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Abort on the first invalid rule instead of skipping it.
    pub strict: bool,
}

impl LoadOptions {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            strict: config.strict_load,
        }
    }
}

/// The rules currently in force, ordered `pre`, unstaged, `post`, keeping
/// storage order within a stage.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    reports: Vec<RuleLoadReport>,
    eval: EvalOptions,
}

impl RuleSet {
    /// Build every live record from `storage` against `registry`.
    ///
    /// Tombstoned records are skipped. A record that fails to decode or
    /// construct is reported and skipped, or aborts the load when `strict`.
    pub fn load(
        storage: &dyn RuleStorage,
        registry: &EntityTypeRegistry,
        strict: bool,
    ) -> Result<Self> {
        let records = storage.list()?;
        let mut rules = Vec::with_capacity(records.len());
        let mut reports = Vec::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            let rule_id = record
                .id
                .clone()
                .unwrap_or_else(|| format!("#{index}"));

            if record.is_tombstoned() {
                reports.push(RuleLoadReport {
                    rule_id,
                    status: LoadStatus::Skipped {
                        reason: "tombstoned".to_string(),
                    },
                });
                continue;
            }

            let built = record
                .to_definition()
                .and_then(|def| Rule::new(&def, registry));

            match built {
                Ok(rule) => {
                    reports.push(RuleLoadReport {
                        rule_id: rule_id.clone(),
                        status: LoadStatus::Loaded { id: rule_id },
                    });
                    rules.push(rule);
                }
                Err(e) if strict => {
                    warn!(rule_id = %rule_id, error = %e, "invalid rule, aborting strict load");
                    return Err(LoadError::Rule { rule_id, source: e });
                }
                Err(e) => {
                    warn!(rule_id = %rule_id, code = e.code(), error = %e, "skipping invalid rule");
                    reports.push(RuleLoadReport {
                        rule_id,
                        status: LoadStatus::Failed {
                            error: e.user_message(),
                        },
                    });
                }
            }
        }

        rules.sort_by_key(|rule| Stage::rank(rule.stage()));

        let failed = reports.iter().filter(|r| r.status.is_failed()).count();
        info!(rules = rules.len(), failed, "loaded rule set");

        Ok(Self {
            rules,
            reports,
            eval: EvalOptions::default(),
        })
    }

    /// [`RuleSet::load`] with strictness and evaluation options from `config`.
    pub fn load_with_config(
        storage: &dyn RuleStorage,
        registry: &EntityTypeRegistry,
        config: &EngineConfig,
    ) -> Result<Self> {
        let options = LoadOptions::from_config(config);
        let set = Self::load(storage, registry, options.strict)?;
        Ok(set.with_eval_options(EvalOptions::from_config(config)))
    }

    pub fn with_eval_options(mut self, eval: EvalOptions) -> Self {
        self.eval = eval;
        self
    }

    /// Active rules in execution order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Per-record load outcomes, in storage order.
    pub fn reports(&self) -> &[RuleLoadReport] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.get_id() == Some(id))
    }

    /// Rules of one entity type, in execution order.
    pub fn rules_for<'a>(&'a self, entity_type: &'a str) -> impl Iterator<Item = &'a Rule> + 'a {
        self.rules
            .iter()
            .filter(move |r| r.entity_type() == entity_type)
    }

    /// Run every matching rule of `entity_type` in order. Each rule sees
    /// the output of the rules before it. Returns the keys that changed
    /// relative to `entity`.
    pub fn run(&self, entity_type: &str, entity: &Record) -> Diff {
        let working = self.apply(entity_type, entity);
        working
            .into_iter()
            .filter(|(key, value)| entity.get(key) != Some(value))
            .collect()
    }

    /// `entity` after every matching rule of `entity_type` has run.
    pub fn apply(&self, entity_type: &str, entity: &Record) -> Record {
        let mut working = entity.clone();
        for rule in self.rules_for(entity_type) {
            if let Some(diff) = rule.exec_with(&working, &self.eval) {
                working.extend(diff);
            }
        }
        working
    }
}
