//! Clause values.
//!
//! A [`Scalar`] is one comparison operand. A [`Value`] is what a filter clause
//! carries: a single scalar, a `between` pair, or an `in` list.

use serde::{Deserialize, Serialize};

/// A single comparison operand.
///
/// Values parsed from a query string are always [`Scalar::Text`]; the numeric
/// and boolean variants exist for values supplied through the builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Boolean operand.
    Bool(bool),
    /// Integer operand.
    Int(i64),
    /// Floating point operand.
    Float(f64),
    /// Text operand.
    Text(String),
}

impl Scalar {
    /// Returns the text, if this is a text operand.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::Float(n) => write!(f, "{n}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<&String> for Scalar {
    fn from(s: &String) -> Self {
        Scalar::Text(s.clone())
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i32> for Scalar {
    fn from(n: i32) -> Self {
        Scalar::Int(n.into())
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Int(n)
    }
}

impl From<u32> for Scalar {
    fn from(n: u32) -> Self {
        Scalar::Int(n.into())
    }
}

impl From<u64> for Scalar {
    fn from(n: u64) -> Self {
        i64::try_from(n).map_or(Scalar::Float(n as f64), Scalar::Int)
    }
}

impl From<usize> for Scalar {
    fn from(n: usize) -> Self {
        i64::try_from(n).map_or(Scalar::Float(n as f64), Scalar::Int)
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Float(n)
    }
}

/// The operand of a filter clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// One operand, for the comparison and pattern operators.
    Scalar(Scalar),
    /// Lower and upper bound, for `between`.
    Pair(Scalar, Scalar),
    /// One or more members, for `in` and `not in`.
    List(Vec<Scalar>),
}

impl Value {
    /// Number of scalars carried.
    pub fn arity(&self) -> usize {
        match self {
            Value::Scalar(_) => 1,
            Value::Pair(_, _) => 2,
            Value::List(items) => items.len(),
        }
    }

    /// Returns the scalars in order.
    pub fn scalars(&self) -> Vec<&Scalar> {
        match self {
            Value::Scalar(s) => vec![s],
            Value::Pair(lo, hi) => vec![lo, hi],
            Value::List(items) => items.iter().collect(),
        }
    }

    /// Returns the operand if this is a single scalar.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Flattens into a list of scalars.
    pub fn into_list(self) -> Vec<Scalar> {
        match self {
            Value::Scalar(s) => vec![s],
            Value::Pair(lo, hi) => vec![lo, hi],
            Value::List(items) => items,
        }
    }
}

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Self {
        Value::Scalar(value)
    }
}

macro_rules! value_from_scalar {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Scalar(value.into())
                }
            }
        )*
    };
}

value_from_scalar!(String, &str, &String, bool, i32, i64, u32, u64, usize, f64);

impl<T: Into<Scalar>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<A: Into<Scalar>, B: Into<Scalar>> From<(A, B)> for Value {
    fn from((lo, hi): (A, B)) -> Self {
        Value::Pair(lo.into(), hi.into())
    }
}
