//! Rules: an AND/OR set of conditions plus an ordered list of actions.

use std::fmt;

use rulebook_core::Record;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::action::{Action, ActionDef};
use crate::condition::{Condition, ConditionDef, EvalOptions};
use crate::error::Result;
use crate::registry::EntityTypeRegistry;

/// Keys of an entity whose values changed after running a rule's actions.
pub type Diff = Record;

/// Coarse execution ordering hint. A rule without a stage runs between
/// `pre` and `post`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Pre,
    Post,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Pre => "pre",
            Stage::Post => "post",
        }
    }

    /// Human label for an optional stage.
    pub fn label(stage: Option<Stage>) -> &'static str {
        match stage {
            Some(Stage::Pre) => "Pre",
            None => "Default",
            Some(Stage::Post) => "Post",
        }
    }

    /// Execution rank: `pre` first, unstaged next, `post` last.
    pub fn rank(stage: Option<Stage>) -> u8 {
        match stage {
            Some(Stage::Pre) => 0,
            None => 1,
            Some(Stage::Post) => 2,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a rule combines its conditions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionsOp {
    #[default]
    And,
    Or,
}

/// Persisted form of a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub entity_type: String,
    #[serde(default)]
    pub stage: Option<Stage>,
    #[serde(default)]
    pub conditions_op: ConditionsOp,
    #[serde(default)]
    pub conditions: Vec<ConditionDef>,
    #[serde(default)]
    pub actions: Vec<ActionDef>,
}

/// A validated rule. Conditions and actions are built eagerly, so a rule
/// that references a field its entity type lacks fails here, at load time.
#[derive(Debug, Clone)]
pub struct Rule {
    id: Option<String>,
    entity_type: String,
    stage: Option<Stage>,
    conditions_op: ConditionsOp,
    conditions: Vec<Condition>,
    actions: Vec<Action>,
}

impl Rule {
    pub fn new(def: &RuleDefinition, registry: &EntityTypeRegistry) -> Result<Self> {
        let entity_type = Some(def.entity_type.as_str());

        let conditions = def
            .conditions
            .iter()
            .map(|c| Condition::from_def(c, entity_type, registry))
            .collect::<Result<Vec<_>>>()?;

        let actions = def
            .actions
            .iter()
            .map(|a| Action::from_def(a, entity_type, registry))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id: def.id.clone(),
            entity_type: def.entity_type.clone(),
            stage: def.stage,
            conditions_op: def.conditions_op,
            conditions,
            actions,
        })
    }

    pub fn get_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    pub fn conditions_op(&self) -> ConditionsOp {
        self.conditions_op
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Whether the conditions hold for `entity`. A rule with no conditions
    /// never matches.
    pub fn eval_conditions(&self, entity: &Record) -> bool {
        self.eval_conditions_with(entity, &EvalOptions::default())
    }

    pub fn eval_conditions_with(&self, entity: &Record, opts: &EvalOptions) -> bool {
        if self.conditions.is_empty() {
            return false;
        }
        match self.conditions_op {
            ConditionsOp::And => self.conditions.iter().all(|c| c.eval_with(entity, opts)),
            ConditionsOp::Or => self.conditions.iter().any(|c| c.eval_with(entity, opts)),
        }
    }

    /// Run every action in order on a copy of `entity` and return the keys
    /// whose values differ from the original.
    pub fn exec_actions(&self, entity: &Record) -> Diff {
        let mut working = entity.clone();
        for action in &self.actions {
            action.exec(&mut working);
        }

        working
            .into_iter()
            .filter(|(key, value)| entity.get(key) != Some(value))
            .collect()
    }

    /// The diff this rule produces for `entity`, or `None` when it does not match.
    pub fn exec(&self, entity: &Record) -> Option<Diff> {
        self.exec_with(entity, &EvalOptions::default())
    }

    pub fn exec_with(&self, entity: &Record, opts: &EvalOptions) -> Option<Diff> {
        if !self.eval_conditions_with(entity, opts) {
            return None;
        }
        let diff = self.exec_actions(entity);
        debug!(
            rule_id = self.id.as_deref().unwrap_or("-"),
            entity_type = %self.entity_type,
            changed = diff.len(),
            "rule matched"
        );
        Some(diff)
    }

    /// `entity` with this rule's diff merged in.
    pub fn apply(&self, entity: &Record) -> Record {
        self.apply_with(entity, &EvalOptions::default())
    }

    pub fn apply_with(&self, entity: &Record, opts: &EvalOptions) -> Record {
        let mut merged = entity.clone();
        if let Some(diff) = self.exec_with(entity, opts) {
            merged.extend(diff);
        }
        merged
    }

    pub fn serialize(&self) -> RuleDefinition {
        RuleDefinition {
            id: self.id.clone(),
            entity_type: self.entity_type.clone(),
            stage: self.stage,
            conditions_op: self.conditions_op,
            conditions: self.conditions.iter().map(Condition::serialize).collect(),
            actions: self.actions.iter().map(Action::serialize).collect(),
        }
    }
}
