//! Rule conditions: a single predicate over one entity field.
//!
//! A [`Condition`] is built from its persisted form ([`ConditionDef`]),
//! validated against the entity type's schema, and evaluated read-only
//! against [`Record`](rulebook_core::Record)s.

mod eval;
mod value;


use regex_lite::Regex;
use rulebook_core::{FieldType, Operator};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, RuleError};
use crate::lattice::legacy_field_type;
use crate::registry::EntityTypeRegistry;

pub use eval::EvalOptions;
pub use value::ConditionValue;

/// Modifiers on how a condition reads the entity value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionOptions {
    /// Only positive amounts match.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub inflow: bool,
    /// Only negative amounts match, compared by magnitude.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub outflow: bool,
    /// Date `is` compares year and month only.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub month: bool,
    /// Date `is` compares the year only.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub year: bool,
}

impl ConditionOptions {
    pub fn is_empty(&self) -> bool {
        *self == ConditionOptions::default()
    }
}

/// Persisted form of a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionDef {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub op: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "ConditionOptions::is_empty")]
    pub options: ConditionOptions,
}

/// A validated predicate over one field.
#[derive(Debug, Clone)]
pub struct Condition {
    field: String,
    op: Operator,
    value: ConditionValue,
    options: ConditionOptions,
    field_type: Option<FieldType>,
    entity_type: Option<String>,
    pattern: Option<Regex>,
}

/// Treat an empty entity type id like an absent one.
pub(crate) fn known_entity_type(entity_type: Option<&str>) -> Option<&str> {
    entity_type.filter(|t| !t.is_empty())
}

/// Data type of `field`: from the schema when the entity type is known,
/// otherwise guessed from the well-known field names.
pub(crate) fn resolve_field_type(
    registry: &EntityTypeRegistry,
    entity_type: Option<&str>,
    field: &str,
) -> Option<FieldType> {
    match known_entity_type(entity_type) {
        Some(t) => registry.field_type(t, field),
        None => legacy_field_type(field),
    }
}

/// Fail with `InvalidField` when the entity type is known and lacks `field`.
pub(crate) fn check_field(
    registry: &EntityTypeRegistry,
    entity_type: Option<&str>,
    field: &str,
) -> Result<()> {
    if let Some(t) = known_entity_type(entity_type) {
        if !field.is_empty() && registry.field(t, field).is_none() {
            return Err(RuleError::InvalidField {
                field: field.to_string(),
                entity_type: t.to_string(),
            });
        }
    }
    Ok(())
}

impl Condition {
    /// Build a condition, validating the field against `entity_type`'s
    /// schema (when given) and shaping `value` for `op`.
    pub fn new(
        op: Operator,
        field: impl Into<String>,
        value: Value,
        options: ConditionOptions,
        entity_type: Option<&str>,
        registry: &EntityTypeRegistry,
    ) -> Result<Self> {
        let field = field.into();
        check_field(registry, entity_type, &field)?;

        if !field.is_empty() && value == Value::String(String::new()) {
            return Err(RuleError::EmptyField(field));
        }

        let shaped = ConditionValue::from_raw(op, &field, value)?;
        let field_type = resolve_field_type(registry, entity_type, &field);
        Self::from_parts(
            field,
            op,
            shaped,
            options,
            field_type,
            known_entity_type(entity_type).map(str::to_string),
        )
    }

    /// Build from the persisted form. An empty or unrecognised `op` fails
    /// with `InvalidOperation`.
    pub fn from_def(
        def: &ConditionDef,
        entity_type: Option<&str>,
        registry: &EntityTypeRegistry,
    ) -> Result<Self> {
        let op: Operator = def
            .op
            .parse()
            .map_err(|_| RuleError::InvalidOperation(def.op.clone()))?;
        Self::new(
            op,
            def.field.clone(),
            def.value.clone(),
            def.options,
            entity_type,
            registry,
        )
    }

    /// Assemble an already-shaped condition. Compiles the `matches` pattern.
    pub(crate) fn from_parts(
        field: String,
        op: Operator,
        value: ConditionValue,
        options: ConditionOptions,
        field_type: Option<FieldType>,
        entity_type: Option<String>,
    ) -> Result<Self> {
        debug_assert_eq!(value.shape(), op.value_shape());

        let pattern = match (op, value.as_scalar()) {
            (Operator::Matches, Some(Value::String(p))) => {
                Some(Regex::new(p).map_err(|e| RuleError::InvalidValue {
                    field: field.clone(),
                    op: op.to_string(),
                    reason: format!("invalid pattern: {e}"),
                })?)
            }
            _ => None,
        };

        Ok(Self {
            field,
            op,
            value,
            options,
            field_type,
            entity_type,
            pattern,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn op(&self) -> Operator {
        self.op
    }

    pub fn value(&self) -> &ConditionValue {
        &self.value
    }

    pub fn options(&self) -> ConditionOptions {
        self.options
    }

    /// Resolved data type of the field, if known.
    pub fn field_type(&self) -> Option<FieldType> {
        self.field_type
    }

    pub fn entity_type(&self) -> Option<&str> {
        self.entity_type.as_deref()
    }

    /// Persisted form. The value is written in the shape it is stored in.
    pub fn serialize(&self) -> ConditionDef {
        ConditionDef {
            field: self.field.clone(),
            op: self.op.to_string(),
            value: self.value.to_json(),
            options: self.options,
        }
    }
}
