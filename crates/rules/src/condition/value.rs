//! Condition values, shaped by operator category.

use rulebook_core::{as_number, number_value, Operator, ValueShape};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::error::{Result, RuleError};

/// Comparison value of a condition.
///
/// The variant always matches the operator's [`ValueShape`]: conditions
/// are only built through constructors that shape the raw value first.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    Scalar(Value),
    Multi(Vec<Value>),
    Range { num1: f64, num2: f64 },
}

impl ConditionValue {
    pub fn shape(&self) -> ValueShape {
        match self {
            ConditionValue::Scalar(_) => ValueShape::Scalar,
            ConditionValue::Multi(_) => ValueShape::Multi,
            ConditionValue::Range { .. } => ValueShape::Range,
        }
    }

    /// The "nothing entered yet" value of a shape.
    pub fn empty(shape: ValueShape) -> Self {
        match shape {
            ValueShape::Scalar => ConditionValue::Scalar(Value::Null),
            ValueShape::Multi => ConditionValue::Multi(Vec::new()),
            ValueShape::Range => ConditionValue::Range { num1: 0.0, num2: 0.0 },
        }
    }

    /// Shape a stored/raw JSON value for `op`.
    ///
    /// Multi operators accept an array, `null` (empty list) or a lone
    /// scalar (wrapped). `isbetween` needs a `{num1, num2}` object. Every
    /// other operator takes a scalar.
    pub fn from_raw(op: Operator, field: &str, raw: Value) -> Result<Self> {
        let invalid = |reason: &str| RuleError::InvalidValue {
            field: field.to_string(),
            op: op.to_string(),
            reason: reason.to_string(),
        };

        match op.value_shape() {
            ValueShape::Multi => match raw {
                Value::Array(items) => Ok(ConditionValue::Multi(items)),
                Value::Null => Ok(ConditionValue::Multi(Vec::new())),
                Value::Object(_) => Err(invalid("expected a list of values")),
                scalar => Ok(ConditionValue::Multi(vec![scalar])),
            },
            ValueShape::Range => {
                let obj = raw
                    .as_object()
                    .ok_or_else(|| invalid("expected an object with num1 and num2"))?;
                let num1 = obj
                    .get("num1")
                    .and_then(as_number)
                    .ok_or_else(|| invalid("num1 must be a number"))?;
                let num2 = obj
                    .get("num2")
                    .and_then(as_number)
                    .ok_or_else(|| invalid("num2 must be a number"))?;
                Ok(ConditionValue::Range { num1, num2 })
            }
            ValueShape::Scalar => match raw {
                Value::Array(_) => Err(invalid("expected a single value, got a list")),
                Value::Object(_) => Err(invalid("expected a single value, got an object")),
                scalar => Ok(ConditionValue::Scalar(scalar)),
            },
        }
    }

    /// Convert to another shape, keeping as much of the value as fits:
    /// a scalar becomes a singleton list or a `{v, v}` range, a list
    /// collapses to its first element, a range to its lower input bound.
    pub fn reshape(&self, target: ValueShape) -> Self {
        match (self, target) {
            (ConditionValue::Scalar(v), ValueShape::Multi) => {
                if v.is_null() {
                    ConditionValue::Multi(Vec::new())
                } else {
                    ConditionValue::Multi(vec![v.clone()])
                }
            }
            (ConditionValue::Scalar(v), ValueShape::Range) => {
                let n = as_number(v).unwrap_or(0.0);
                ConditionValue::Range { num1: n, num2: n }
            }
            (ConditionValue::Multi(items), ValueShape::Scalar) => {
                ConditionValue::Scalar(items.first().cloned().unwrap_or(Value::Null))
            }
            (ConditionValue::Multi(items), ValueShape::Range) => {
                let n = items.first().and_then(as_number).unwrap_or(0.0);
                ConditionValue::Range { num1: n, num2: n }
            }
            (ConditionValue::Range { num1, .. }, ValueShape::Scalar) => {
                ConditionValue::Scalar(number_value(*num1))
            }
            (ConditionValue::Range { num1, .. }, ValueShape::Multi) => {
                ConditionValue::Multi(vec![number_value(*num1)])
            }
            (same, _) => same.clone(),
        }
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            ConditionValue::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_multi(&self) -> Option<&[Value]> {
        match self {
            ConditionValue::Multi(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<(f64, f64)> {
        match self {
            ConditionValue::Range { num1, num2 } => Some((*num1, *num2)),
            _ => None,
        }
    }

    /// JSON form as persisted.
    pub fn to_json(&self) -> Value {
        match self {
            ConditionValue::Scalar(v) => v.clone(),
            ConditionValue::Multi(items) => Value::Array(items.clone()),
            ConditionValue::Range { num1, num2 } => serde_json::json!({
                "num1": number_value(*num1),
                "num2": number_value(*num2),
            }),
        }
    }
}

impl Serialize for ConditionValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ConditionValue::Scalar(v) => v.serialize(serializer),
            ConditionValue::Multi(items) => items.serialize(serializer),
            ConditionValue::Range { num1, num2 } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("num1", &number_value(*num1))?;
                map.serialize_entry("num2", &number_value(*num2))?;
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn multi_accepts_lists_null_and_scalars() {
        assert_eq!(
            ConditionValue::from_raw(Operator::OneOf, "name", json!(["a", "b"])).unwrap(),
            ConditionValue::Multi(vec![json!("a"), json!("b")])
        );
        assert_eq!(
            ConditionValue::from_raw(Operator::NotOneOf, "name", Value::Null).unwrap(),
            ConditionValue::Multi(vec![])
        );
        assert_eq!(
            ConditionValue::from_raw(Operator::OneOf, "name", json!("Alice")).unwrap(),
            ConditionValue::Multi(vec![json!("Alice")])
        );
    }

    #[test]
    fn range_requires_both_bounds() {
        assert_eq!(
            ConditionValue::from_raw(Operator::IsBetween, "price", json!({"num1": 10, "num2": 2}))
                .unwrap(),
            ConditionValue::Range { num1: 10.0, num2: 2.0 }
        );
        let err = ConditionValue::from_raw(Operator::IsBetween, "price", json!({"num1": 1}))
            .unwrap_err();
        assert_eq!(err.code(), "invalid-value");
        assert!(ConditionValue::from_raw(Operator::IsBetween, "price", json!(5)).is_err());
    }

    #[test]
    fn scalar_ops_reject_lists() {
        assert!(ConditionValue::from_raw(Operator::Is, "name", json!(["a"])).is_err());
        assert!(ConditionValue::from_raw(Operator::Gt, "price", json!({"num1": 1})).is_err());
    }

    #[test]
    fn reshape_transitions() {
        let scalar = ConditionValue::Scalar(json!(7));
        assert_eq!(scalar.reshape(ValueShape::Multi), ConditionValue::Multi(vec![json!(7)]));
        assert_eq!(
            scalar.reshape(ValueShape::Range),
            ConditionValue::Range { num1: 7.0, num2: 7.0 }
        );

        let null = ConditionValue::Scalar(Value::Null);
        assert_eq!(null.reshape(ValueShape::Multi), ConditionValue::Multi(vec![]));

        let list = ConditionValue::Multi(vec![json!("x"), json!("y")]);
        assert_eq!(list.reshape(ValueShape::Scalar), ConditionValue::Scalar(json!("x")));
        assert_eq!(
            ConditionValue::Multi(vec![]).reshape(ValueShape::Scalar),
            ConditionValue::Scalar(Value::Null)
        );

        let range = ConditionValue::Range { num1: 4.0, num2: 9.0 };
        assert_eq!(range.reshape(ValueShape::Scalar), ConditionValue::Scalar(json!(4)));
        assert_eq!(range.reshape(ValueShape::Range), range);
    }

    #[test]
    fn serializes_as_stored_shape() {
        let range = ConditionValue::Range { num1: 2.0, num2: 10.5 };
        assert_eq!(serde_json::to_value(&range).unwrap(), json!({"num1": 2, "num2": 10.5}));
        assert_eq!(range.to_json(), json!({"num1": 2, "num2": 10.5}));

        let list = ConditionValue::Multi(vec![json!(1), json!("two")]);
        assert_eq!(serde_json::to_value(&list).unwrap(), json!([1, "two"]));
    }
}
