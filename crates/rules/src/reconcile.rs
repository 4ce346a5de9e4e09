//! Keeping a condition's value shaped for its operator while it is edited.
//!
//! Editors change one thing at a time: the field, the operator or the raw
//! value. Each edit goes through [`ConditionEditor`], which returns a new
//! [`Condition`] whose value is consistent with its operator.

use rulebook_core::{number_value, FieldType, Operator};
use serde_json::Value;

use crate::condition::{
    check_field, known_entity_type, resolve_field_type, Condition, ConditionOptions,
    ConditionValue,
};
use crate::error::Result;
use crate::lattice::get_valid_ops_legacy;
use crate::registry::EntityTypeRegistry;

/// Editor-only field names that target `amount` with a sign filter.
const AMOUNT_INFLOW: &str = "amount-inflow";
const AMOUNT_OUTFLOW: &str = "amount-outflow";

/// One edit to a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionEdit {
    SetField(String),
    SetOp(Operator),
    SetValue(Value),
}

/// Split an editor field name into the stored field and the options it implies.
fn split_pseudo_field(field: &str) -> (&str, ConditionOptions) {
    match field {
        AMOUNT_INFLOW => (
            "amount",
            ConditionOptions {
                inflow: true,
                ..ConditionOptions::default()
            },
        ),
        AMOUNT_OUTFLOW => (
            "amount",
            ConditionOptions {
                outflow: true,
                ..ConditionOptions::default()
            },
        ),
        other => (other, ConditionOptions::default()),
    }
}

/// Fill in the "nothing entered" value: numbers default to `0`.
fn normalize(field_type: Option<FieldType>, value: ConditionValue) -> ConditionValue {
    match value {
        ConditionValue::Scalar(Value::Null) if field_type == Some(FieldType::Number) => {
            ConditionValue::Scalar(number_value(0.0))
        }
        other => other,
    }
}

/// Reshapes conditions of one entity type as they are edited.
#[derive(Debug, Clone, Copy)]
pub struct ConditionEditor<'a> {
    registry: &'a EntityTypeRegistry,
    entity_type: Option<&'a str>,
}

impl<'a> ConditionEditor<'a> {
    /// `entity_type` of `None` falls back to the legacy field-name lookup.
    pub fn new(registry: &'a EntityTypeRegistry, entity_type: Option<&'a str>) -> Self {
        Self {
            registry,
            entity_type: known_entity_type(entity_type),
        }
    }

    /// Data type of an editor field name.
    pub fn field_type(&self, field: &str) -> Option<FieldType> {
        let (field, _) = split_pseudo_field(field);
        resolve_field_type(self.registry, self.entity_type, field)
    }

    /// Operators the editor may offer for `field`, in lattice order.
    pub fn valid_ops(&self, field: &str) -> Vec<Operator> {
        let (field, _) = split_pseudo_field(field);
        match self.entity_type {
            Some(t) => self.registry.get_valid_ops(t, field),
            None => get_valid_ops_legacy(field),
        }
    }

    pub fn apply(&self, condition: &Condition, edit: ConditionEdit) -> Result<Condition> {
        match edit {
            ConditionEdit::SetField(field) => self.set_field(condition, &field),
            ConditionEdit::SetOp(op) => self.set_op(condition, op),
            ConditionEdit::SetValue(value) => self.set_value(condition, value),
        }
    }

    /// Point the condition at another field.
    ///
    /// Op and value survive only between string or number fields of the
    /// same type, outside `isbetween`, when the op is still legal. A
    /// multi-valued op still legal on the new field otherwise keeps its op
    /// with an emptied list; anything else resets to the new field's first
    /// legal op and an empty value.
    pub fn set_field(&self, condition: &Condition, field: &str) -> Result<Condition> {
        let (stored, options) = split_pseudo_field(field);
        check_field(self.registry, self.entity_type, stored)?;

        let op = condition.op();
        let old_type = condition.field_type();
        let new_type = self.field_type(field);

        let keep = old_type == new_type
            && matches!(new_type, Some(FieldType::String | FieldType::Number))
            && op != Operator::IsBetween
            && self.valid_ops(field).contains(&op);

        let (op, value) = if keep {
            (op, normalize(new_type, condition.value().clone()))
        } else if op.is_multi() && self.valid_ops(field).contains(&op) {
            (op, ConditionValue::Multi(Vec::new()))
        } else {
            let first = self
                .valid_ops(field)
                .first()
                .copied()
                .unwrap_or(Operator::Is);
            (first, normalize(new_type, ConditionValue::empty(first.value_shape())))
        };

        self.rebuild(condition, stored, op, value, options, new_type)
    }

    /// Switch operator, converting the value to the new op's shape.
    pub fn set_op(&self, condition: &Condition, op: Operator) -> Result<Condition> {
        let field_type = condition.field_type();
        let value = normalize(field_type, condition.value().reshape(op.value_shape()));
        self.rebuild(
            condition,
            condition.field(),
            op,
            value,
            condition.options(),
            field_type,
        )
    }

    /// Replace the raw value, shaped for the current op.
    pub fn set_value(&self, condition: &Condition, value: Value) -> Result<Condition> {
        let op = condition.op();
        let field_type = condition.field_type();
        let shaped = normalize(
            field_type,
            ConditionValue::from_raw(op, condition.field(), value)?,
        );
        self.rebuild(
            condition,
            condition.field(),
            op,
            shaped,
            condition.options(),
            field_type,
        )
    }

    fn rebuild(
        &self,
        condition: &Condition,
        field: &str,
        op: Operator,
        value: ConditionValue,
        options: ConditionOptions,
        field_type: Option<FieldType>,
    ) -> Result<Condition> {
        Condition::from_parts(
            field.to_string(),
            op,
            value,
            options,
            field_type,
            condition
                .entity_type()
                .or(self.entity_type)
                .map(str::to_string),
        )
    }
}
