//! Entity-agnostic rules engine.
//!
//! This crate provides:
//! - An entity type registry with per-field data types and operator limits
//! - Conditions (field/operator/value predicates) and actions (`set`,
//!   `delete-entity`) validated against that registry at construction
//! - Rules combining them with AND/OR, producing minimal diffs
//! - Value-shape reconciliation for condition editors
//! - YAML entity-type and rule documents, and rule-set loading from storage

pub mod action;
pub mod condition;
pub mod engine;
pub mod error;
pub mod lattice;
pub mod loader;
pub mod reconcile;
pub mod registry;
pub mod rule;
pub mod schema;

pub use action::{Action, ActionDef, ActionOp, ActionOptions};
pub use condition::{Condition, ConditionDef, ConditionOptions, ConditionValue, EvalOptions};
pub use engine::Engine;
pub use error::{Result, RuleError};
pub use loader::{LoadError, MemoryRuleStorage, RuleRecord, RuleSet, RuleStorage};
pub use reconcile::{ConditionEdit, ConditionEditor};
pub use registry::{DefaultFields, EntityTypeDefinition, EntityTypeRegistry, FieldDefinition};
pub use rule::{ConditionsOp, Diff, Rule, RuleDefinition, Stage};
