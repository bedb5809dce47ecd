//! Comparison operators and their wire tokens.
//!
//! The [`Op`] enum is the structured half of the operator table. Each operator
//! has a conventional symbol (`>=`) used in clauses and a short token (`gte`)
//! used on the query-string wire. The free functions [`to_wire`] and
//! [`from_wire`] work on plain strings and pass anything they do not know
//! through unchanged, so tokens newer than this table still flow end to end.

use serde::{Deserialize, Serialize};

/// Comparison operator for a filter clause.
///
/// | Symbol     | Wire token |
/// |------------|------------|
/// | `=`        | `eq`       |
/// | `!=`       | `!eq`      |
/// | `<`        | `lt`       |
/// | `<=`       | `lte`      |
/// | `>`        | `gt`       |
/// | `>=`       | `gte`      |
/// | `like`     | `like`     |
/// | `not like` | `!like`    |
/// | `between`  | `between`  |
/// | `in`       | `in`       |
/// | `not in`   | `!in`      |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Op {
    /// Equal.
    #[serde(rename = "=")]
    Eq,
    /// Not equal.
    #[serde(rename = "!=")]
    Ne,
    /// Less than.
    #[serde(rename = "<")]
    Lt,
    /// Less than or equal.
    #[serde(rename = "<=")]
    Lte,
    /// Greater than.
    #[serde(rename = ">")]
    Gt,
    /// Greater than or equal.
    #[serde(rename = ">=")]
    Gte,
    /// Pattern match.
    #[serde(rename = "like")]
    Like,
    /// Negated pattern match.
    #[serde(rename = "not like")]
    NotLike,
    /// Inclusive range; the value is a pair.
    #[serde(rename = "between")]
    Between,
    /// Set membership; the value is a list.
    #[serde(rename = "in")]
    In,
    /// Negated set membership; the value is a list.
    #[serde(rename = "not in")]
    NotIn,
}

impl Op {
    /// Every operator in the table, in table order.
    pub const ALL: [Op; 11] = [
        Op::Eq,
        Op::Ne,
        Op::Lt,
        Op::Lte,
        Op::Gt,
        Op::Gte,
        Op::Like,
        Op::NotLike,
        Op::Between,
        Op::In,
        Op::NotIn,
    ];

    /// Returns the structured spelling used in clauses.
    pub fn symbol(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Like => "like",
            Op::NotLike => "not like",
            Op::Between => "between",
            Op::In => "in",
            Op::NotIn => "not in",
        }
    }

    /// Returns the short token used on the wire.
    pub fn wire(self) -> &'static str {
        match self {
            Op::Eq => "eq",
            Op::Ne => "!eq",
            Op::Lt => "lt",
            Op::Lte => "lte",
            Op::Gt => "gt",
            Op::Gte => "gte",
            Op::Like => "like",
            Op::NotLike => "!like",
            Op::Between => "between",
            Op::In => "in",
            Op::NotIn => "!in",
        }
    }

    /// Looks up an operator by its structured spelling.
    pub fn from_symbol(symbol: &str) -> Option<Op> {
        Op::ALL.into_iter().find(|op| op.symbol() == symbol)
    }

    /// Looks up an operator by its wire token.
    pub fn from_wire(token: &str) -> Option<Op> {
        Op::ALL.into_iter().find(|op| op.wire() == token)
    }

    /// Returns the logical complement, where the table has one.
    pub fn negate(self) -> Option<Op> {
        match self {
            Op::Eq => Some(Op::Ne),
            Op::Ne => Some(Op::Eq),
            Op::Lt => Some(Op::Gte),
            Op::Gte => Some(Op::Lt),
            Op::Gt => Some(Op::Lte),
            Op::Lte => Some(Op::Gt),
            Op::Like => Some(Op::NotLike),
            Op::NotLike => Some(Op::Like),
            Op::In => Some(Op::NotIn),
            Op::NotIn => Some(Op::In),
            Op::Between => None,
        }
    }

    /// Returns `true` if the operator takes a list of values.
    pub fn is_list(self) -> bool {
        matches!(self, Op::In | Op::NotIn)
    }

    /// Returns `true` if the operator takes a pair of bounds.
    pub fn is_range(self) -> bool {
        matches!(self, Op::Between)
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Converts a structured operator to its wire token.
///
/// Unknown operators are returned unchanged.
pub fn to_wire(op: &str) -> &str {
    Op::from_symbol(op).map_or(op, |known| known.wire())
}

/// Converts a wire token to its structured operator.
///
/// Unknown tokens are returned unchanged.
pub fn from_wire(token: &str) -> &str {
    Op::from_wire(token).map_or(token, |known| known.symbol())
}

/// Converts a builder operator to the token the compiler emits.
///
/// Same as [`to_wire`], except that `<>` renders as `eq`. The remote grammar
/// has always read `<>` that way; it is kept for compatibility.
pub fn compile_operator(op: &str) -> &str {
    match op {
        "<>" => "eq",
        other => to_wire(other),
    }
}
