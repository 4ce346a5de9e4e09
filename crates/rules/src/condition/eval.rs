//! Condition evaluation against entity records.

use std::cmp::Ordering;

use chrono::{Datelike, NaiveDate};
use rulebook_core::config::DEFAULT_DATE_APPROX_DAYS;
use rulebook_core::{as_number, parse_date, EngineConfig, FieldType, Operator, Record};
use serde_json::Value;

use super::{Condition, ConditionValue};
use crate::lattice::sort_numbers;

/// Share of the expected number an `isapprox` match may deviate by.
const APPROX_NUMBER_RATIO: f64 = 0.075;

/// Tunables for evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalOptions {
    /// Days either side of the expected date that `isapprox` accepts.
    pub date_approx_days: i64,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            date_approx_days: DEFAULT_DATE_APPROX_DAYS,
        }
    }
}

impl EvalOptions {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            date_approx_days: config.date_approx_days,
        }
    }
}

/// Tolerance of a numeric `isapprox`: 7.5% of the expected magnitude, rounded.
pub fn approx_number_threshold(expected: f64) -> f64 {
    (expected.abs() * APPROX_NUMBER_RATIO).round()
}

/// Equality that treats `1` and `1.0` as the same number.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

impl Condition {
    /// Evaluate with default options. Never mutates `entity`.
    pub fn eval(&self, entity: &Record) -> bool {
        self.eval_with(entity, &EvalOptions::default())
    }

    pub fn eval_with(&self, entity: &Record, opts: &EvalOptions) -> bool {
        let actual = entity.get(&self.field).unwrap_or(&Value::Null);

        match self.op {
            Operator::Is => self.is_equal(actual),
            Operator::IsNot => !self.is_equal(actual),
            Operator::OneOf => self.is_one_of(actual),
            Operator::NotOneOf => !self.is_one_of(actual),
            Operator::Contains => self.contains(actual),
            Operator::DoesNotContain => !self.contains(actual),
            Operator::Matches => self.matches_pattern(actual),
            Operator::IsApprox => self.is_approx(actual, opts),
            Operator::IsBetween => self.is_between(actual),
            Operator::Gt => self.compare(actual) == Some(Ordering::Greater),
            Operator::Gte => matches!(
                self.compare(actual),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::Lt => self.compare(actual) == Some(Ordering::Less),
            Operator::Lte => matches!(
                self.compare(actual),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }

    fn expected(&self) -> &Value {
        self.value.as_scalar().unwrap_or(&Value::Null)
    }

    fn is_date_field(&self, actual: &Value) -> bool {
        match self.field_type {
            Some(t) => t == FieldType::Date,
            None => parse_date(actual).is_some() && parse_date(self.expected()).is_some(),
        }
    }

    fn is_number_field(&self, actual: &Value) -> bool {
        match self.field_type {
            Some(t) => t == FieldType::Number,
            None => actual.is_number() && self.expected().is_number(),
        }
    }

    /// Entity number after applying the inflow/outflow options.
    fn actual_number(&self, actual: &Value) -> Option<f64> {
        let n = as_number(actual)?;
        if self.options.inflow {
            (n > 0.0).then_some(n)
        } else if self.options.outflow {
            (n < 0.0).then_some(-n)
        } else {
            Some(n)
        }
    }

    fn dates(&self, actual: &Value) -> Option<(NaiveDate, NaiveDate)> {
        Some((parse_date(actual)?, parse_date(self.expected())?))
    }

    fn is_equal(&self, actual: &Value) -> bool {
        let expected = self.expected();

        if self.is_date_field(actual) {
            if let Some((a, e)) = self.dates(actual) {
                return if self.options.year {
                    a.year() == e.year()
                } else if self.options.month {
                    a.year() == e.year() && a.month() == e.month()
                } else {
                    a == e
                };
            }
        }

        if self.is_number_field(actual) {
            if let Some(e) = as_number(expected) {
                return self.actual_number(actual) == Some(e);
            }
        }

        values_equal(actual, expected)
    }

    fn is_one_of(&self, actual: &Value) -> bool {
        self.value
            .as_multi()
            .map(|items| items.iter().any(|item| values_equal(actual, item)))
            .unwrap_or(false)
    }

    fn contains(&self, actual: &Value) -> bool {
        let expected = self.expected();
        match (actual, expected) {
            (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
            (Value::Array(items), _) => items.iter().any(|item| values_equal(item, expected)),
            _ => false,
        }
    }

    fn matches_pattern(&self, actual: &Value) -> bool {
        match (&self.pattern, actual) {
            (Some(re), Value::String(s)) => re.is_match(s),
            _ => false,
        }
    }

    fn is_approx(&self, actual: &Value, opts: &EvalOptions) -> bool {
        if self.is_date_field(actual) {
            return self
                .dates(actual)
                .map(|(a, e)| (a - e).num_days().abs() <= opts.date_approx_days)
                .unwrap_or(false);
        }

        match (self.actual_number(actual), as_number(self.expected())) {
            (Some(a), Some(e)) => (a - e).abs() <= approx_number_threshold(e),
            _ => false,
        }
    }

    fn is_between(&self, actual: &Value) -> bool {
        let (num1, num2) = match &self.value {
            ConditionValue::Range { num1, num2 } => (*num1, *num2),
            _ => return false,
        };
        let (low, high) = sort_numbers(num1, num2);
        self.actual_number(actual)
            .map(|a| low <= a && a <= high)
            .unwrap_or(false)
    }

    /// Ordering of the entity value relative to the expected value, when
    /// both sides are comparable for the field's type.
    fn compare(&self, actual: &Value) -> Option<Ordering> {
        let expected = self.expected();

        if self.is_date_field(actual) {
            let (a, e) = self.dates(actual)?;
            return Some(a.cmp(&e));
        }

        if self.is_number_field(actual) {
            let a = self.actual_number(actual)?;
            let e = as_number(expected)?;
            return a.partial_cmp(&e);
        }

        match (actual, expected) {
            (Value::String(a), Value::String(e)) => Some(a.cmp(e)),
            _ => None,
        }
    }
}
