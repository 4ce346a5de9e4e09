//! Type/operator lattice: which operators each field data type supports.

use rulebook_core::{FieldType, Operator};

use crate::registry::EntityTypeRegistry;

/// Legal operators (in editor order) and nullability of a data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInfo {
    pub ops: &'static [Operator],
    pub nullable: bool,
}

const DATE_OPS: &[Operator] = &[
    Operator::Is,
    Operator::IsApprox,
    Operator::Gt,
    Operator::Gte,
    Operator::Lt,
    Operator::Lte,
];

const TEXT_OPS: &[Operator] = &[
    Operator::Is,
    Operator::Contains,
    Operator::Matches,
    Operator::OneOf,
    Operator::IsNot,
    Operator::DoesNotContain,
    Operator::NotOneOf,
];

const NUMBER_OPS: &[Operator] = &[
    Operator::Is,
    Operator::IsApprox,
    Operator::IsBetween,
    Operator::Gt,
    Operator::Gte,
    Operator::Lt,
    Operator::Lte,
];

const BOOLEAN_OPS: &[Operator] = &[Operator::Is];

const LEGACY_NOTES_OPS: &[Operator] = &[
    Operator::Is,
    Operator::IsNot,
    Operator::Contains,
    Operator::Matches,
    Operator::DoesNotContain,
];

pub fn type_info(field_type: FieldType) -> TypeInfo {
    match field_type {
        FieldType::Date => TypeInfo { ops: DATE_OPS, nullable: false },
        FieldType::Id => TypeInfo { ops: TEXT_OPS, nullable: true },
        FieldType::String => TypeInfo { ops: TEXT_OPS, nullable: true },
        FieldType::Number => TypeInfo { ops: NUMBER_OPS, nullable: false },
        FieldType::Boolean => TypeInfo { ops: BOOLEAN_OPS, nullable: false },
    }
}

impl EntityTypeRegistry {
    /// Whether `op` may be used on `field` of `entity_type`: the field must
    /// exist, the op must be legal for its data type and not disallowed.
    pub fn is_valid_op(&self, entity_type: &str, field: &str, op: Operator) -> bool {
        match self.field(entity_type, field) {
            Some(def) => {
                !def.disallowed_ops.contains(&op) && type_info(def.field_type).ops.contains(&op)
            }
            None => false,
        }
    }

    /// Legal operators of a field in lattice order, minus its disallowed ops.
    /// Empty for unknown types or fields.
    pub fn get_valid_ops(&self, entity_type: &str, field: &str) -> Vec<Operator> {
        match self.field(entity_type, field) {
            Some(def) => type_info(def.field_type)
                .ops
                .iter()
                .copied()
                .filter(|op| !def.disallowed_ops.contains(op))
                .collect(),
            None => Vec::new(),
        }
    }
}

// ── Legacy name-based fallback ──────────────────────────────────────
//
// Only for callers that have no entity type. Recognises the three implicit
// field names and nothing else.

/// Data type inferred from a well-known field name.
pub fn legacy_field_type(field: &str) -> Option<FieldType> {
    match field {
        "date" => Some(FieldType::Date),
        "notes" => Some(FieldType::String),
        "amount" => Some(FieldType::Number),
        _ => None,
    }
}

pub fn get_valid_ops_legacy(field: &str) -> Vec<Operator> {
    let ops: &[Operator] = match field {
        "date" => DATE_OPS,
        "amount" => NUMBER_OPS,
        "notes" => LEGACY_NOTES_OPS,
        _ => &[],
    };
    ops.to_vec()
}

pub fn is_valid_op_legacy(field: &str, op: Operator) -> bool {
    get_valid_ops_legacy(field).contains(&op)
}

/// Order two bounds so the smaller comes first.
pub fn sort_numbers(num1: f64, num2: f64) -> (f64, f64) {
    if num1 < num2 {
        (num1, num2)
    } else {
        (num2, num1)
    }
}
