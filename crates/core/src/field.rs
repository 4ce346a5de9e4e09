//! Field data types and condition operators shared by every rule consumer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Data type of an entity field as seen by the rules engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Date,
    Id,
    String,
    Number,
    Boolean,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Date => "date",
            FieldType::Id => "id",
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(FieldType::Date),
            "id" => Ok(FieldType::Id),
            "string" => Ok(FieldType::String),
            "number" => Ok(FieldType::Number),
            "boolean" => Ok(FieldType::Boolean),
            other => Err(CoreError::UnknownFieldType(other.to_string())),
        }
    }
}

/// Comparison operator of a rule condition.
///
/// The serialized names match the persisted rule format (`isNot`,
/// `oneOf`, `isapprox`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "is")]
    Is,
    #[serde(rename = "isNot")]
    IsNot,
    #[serde(rename = "oneOf")]
    OneOf,
    #[serde(rename = "notOneOf")]
    NotOneOf,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "doesNotContain")]
    DoesNotContain,
    #[serde(rename = "matches")]
    Matches,
    #[serde(rename = "isapprox")]
    IsApprox,
    #[serde(rename = "isbetween")]
    IsBetween,
    #[serde(rename = "gt")]
    Gt,
    #[serde(rename = "gte")]
    Gte,
    #[serde(rename = "lt")]
    Lt,
    #[serde(rename = "lte")]
    Lte,
}

/// The stored shape a condition value takes under a given operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// A single JSON value.
    Scalar,
    /// An array of JSON values (`oneOf` / `notOneOf`).
    Multi,
    /// A `{num1, num2}` numeric range (`isbetween`).
    Range,
}

impl Operator {
    pub const ALL: [Operator; 13] = [
        Operator::Is,
        Operator::IsNot,
        Operator::OneOf,
        Operator::NotOneOf,
        Operator::Contains,
        Operator::DoesNotContain,
        Operator::Matches,
        Operator::IsApprox,
        Operator::IsBetween,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Is => "is",
            Operator::IsNot => "isNot",
            Operator::OneOf => "oneOf",
            Operator::NotOneOf => "notOneOf",
            Operator::Contains => "contains",
            Operator::DoesNotContain => "doesNotContain",
            Operator::Matches => "matches",
            Operator::IsApprox => "isapprox",
            Operator::IsBetween => "isbetween",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
        }
    }

    /// `oneOf` and `notOneOf` compare against a list of values.
    pub fn is_multi(&self) -> bool {
        matches!(self, Operator::OneOf | Operator::NotOneOf)
    }

    pub fn value_shape(&self) -> ValueShape {
        match self {
            Operator::OneOf | Operator::NotOneOf => ValueShape::Multi,
            Operator::IsBetween => ValueShape::Range,
            _ => ValueShape::Scalar,
        }
    }

    /// Human-readable label, with date-flavoured wording for ordered comparisons.
    pub fn friendly(&self, field_type: Option<FieldType>) -> &'static str {
        let is_date = field_type == Some(FieldType::Date);
        match self {
            Operator::Is => "is",
            Operator::IsNot => "is not",
            Operator::OneOf => "one of",
            Operator::NotOneOf => "not one of",
            Operator::Contains => "contains",
            Operator::DoesNotContain => "does not contain",
            Operator::Matches => "matches",
            Operator::IsApprox => "is approx",
            Operator::IsBetween => "is between",
            Operator::Gt if is_date => "is after",
            Operator::Gt => "is greater than",
            Operator::Gte if is_date => "is after or equals",
            Operator::Gte => "is greater than or equals",
            Operator::Lt if is_date => "is before",
            Operator::Lt => "is less than",
            Operator::Lte if is_date => "is before or equals",
            Operator::Lte => "is less than or equals",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| CoreError::UnknownOperator(s.to_string()))
    }
}
