//! Filter clauses.
//!
//! A [`FilterClause`] is one field predicate: a field name, an operator and
//! its operand. [`FilterClause::new`] enforces the operator's arity.

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};
use crate::op::Op;
use crate::value::Value;

/// A single filter predicate.
///
/// # Example
///
/// ```
/// use queryfly::{FilterClause, Op, Value};
///
/// let clause = FilterClause::new("age", Op::In, vec!["1", "2"]).unwrap();
/// assert_eq!(clause.value.arity(), 2);
///
/// assert!(FilterClause::new("age", Op::Between, vec!["1"]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterClause {
    /// The field the predicate applies to.
    pub field: String,
    /// The structured operator.
    #[serde(rename = "operator")]
    pub op: Op,
    /// The operand.
    pub value: Value,
    /// Set by callers that negate the whole predicate.
    ///
    /// The query-string parser never sets it; a leading `!` on a field key
    /// is recognised and discarded.
    #[serde(default)]
    pub negated: bool,
}

impl FilterClause {
    /// Creates a clause, checking the operand against the operator.
    ///
    /// - `between` needs exactly two values; a two-element list becomes a pair.
    /// - `in` and `not in` need at least one value; a scalar or pair becomes a list.
    /// - every other operator needs a single scalar.
    pub fn new(field: impl Into<String>, op: Op, value: impl Into<Value>) -> Result<Self> {
        let value = normalize(op, value.into())?;
        Ok(FilterClause {
            field: field.into(),
            op,
            value,
            negated: false,
        })
    }

    /// Returns the clause with its `negated` flag set.
    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }
}

fn normalize(op: Op, value: Value) -> Result<Value> {
    let actual = value.arity();
    if op.is_range() {
        return match value {
            Value::Pair(lo, hi) => Ok(Value::Pair(lo, hi)),
            Value::List(items) if items.len() == 2 => {
                let mut items = items.into_iter();
                match (items.next(), items.next()) {
                    (Some(lo), Some(hi)) => Ok(Value::Pair(lo, hi)),
                    _ => Err(arity(op, "exactly 2", actual)),
                }
            }
            _ => Err(arity(op, "exactly 2", actual)),
        };
    }

    if op.is_list() {
        let items = value.into_list();
        if items.is_empty() {
            return Err(arity(op, "at least 1", 0));
        }
        return Ok(Value::List(items));
    }

    match value {
        Value::Scalar(s) => Ok(Value::Scalar(s)),
        _ => Err(arity(op, "exactly 1", actual)),
    }
}

fn arity(op: Op, expected: &'static str, actual: usize) -> QueryError {
    QueryError::InvalidArity {
        op,
        expected,
        actual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Scalar;

    #[test]
    fn scalar_operators_take_one_value() {
        let clause = FilterClause::new("age", Op::Gte, "18").unwrap();
        assert_eq!(clause.value, Value::Scalar(Scalar::from("18")));
        assert!(!clause.negated);

        assert!(FilterClause::new("age", Op::Eq, vec!["1", "2"]).is_err());
    }

    #[test]
    fn between_needs_exactly_two() {
        let clause = FilterClause::new("age", Op::Between, vec![1, 5]).unwrap();
        assert_eq!(clause.value, Value::Pair(Scalar::Int(1), Scalar::Int(5)));

        let clause = FilterClause::new("age", Op::Between, (1, 5)).unwrap();
        assert_eq!(clause.value.arity(), 2);

        for bad in [vec![1], vec![1, 2, 3]] {
            let err = FilterClause::new("age", Op::Between, bad).unwrap_err();
            assert!(matches!(err, QueryError::InvalidArity { op: Op::Between, .. }));
        }
        assert!(FilterClause::new("age", Op::Between, 3).is_err());
    }

    #[test]
    fn in_needs_at_least_one() {
        let clause = FilterClause::new("id", Op::In, "7").unwrap();
        assert_eq!(clause.value, Value::List(vec![Scalar::from("7")]));

        let err = FilterClause::new("id", Op::NotIn, Vec::<String>::new()).unwrap_err();
        assert!(matches!(
            err,
            QueryError::InvalidArity {
                op: Op::NotIn,
                actual: 0,
                ..
            }
        ));
    }

    #[test]
    fn negate_toggles() {
        let clause = FilterClause::new("name", Op::Like, "a%").unwrap().negate();
        assert!(clause.negated);
        assert!(!clause.negate().negated);
    }
}
