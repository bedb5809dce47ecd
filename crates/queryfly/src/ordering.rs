//! Ordering clauses.
//!
//! The parser keeps the direction token exactly as the caller wrote it
//! (`1`, `-1`, `asc`, `desc`, ...). [`Direction::dir`] resolves it when a
//! clause is applied.

use serde::{Deserialize, Serialize};

/// Resolved sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dir {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl Dir {
    /// Returns the signed form used on the wire: `1` or `-1`.
    pub fn signed(self) -> i8 {
        match self {
            Dir::Asc => 1,
            Dir::Desc => -1,
        }
    }

    /// Returns the display name of this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "asc",
            Dir::Desc => "desc",
        }
    }

    /// Resolves a direction token.
    ///
    /// `asc` (any case) and `1` are ascending; every other token is descending.
    pub fn parse(token: &str) -> Dir {
        let token = token.trim();
        if token == "1" || token.eq_ignore_ascii_case("asc") {
            Dir::Asc
        } else {
            Dir::Desc
        }
    }
}

impl std::fmt::Display for Dir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw direction token as it appeared in the query string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Direction(String);

impl Direction {
    pub fn new(token: impl Into<String>) -> Self {
        Direction(token.into())
    }

    /// The token verbatim.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The token resolved to a [`Dir`].
    pub fn dir(&self) -> Dir {
        Dir::parse(&self.0)
    }
}

impl From<Dir> for Direction {
    fn from(dir: Dir) -> Self {
        Direction(dir.signed().to_string())
    }
}

impl From<&str> for Direction {
    fn from(token: &str) -> Self {
        Direction::new(token)
    }
}

impl From<String> for Direction {
    fn from(token: String) -> Self {
        Direction(token)
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single ordering clause. Clauses apply in the order they were recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderClause {
    /// The field to sort by.
    pub field: String,
    /// The direction token.
    pub direction: Direction,
}

impl OrderClause {
    pub fn new(field: impl Into<String>, direction: impl Into<Direction>) -> Self {
        OrderClause {
            field: field.into(),
            direction: direction.into(),
        }
    }

    /// Creates an ascending clause.
    pub fn asc(field: impl Into<String>) -> Self {
        OrderClause::new(field, Dir::Asc)
    }

    /// Creates a descending clause.
    pub fn desc(field: impl Into<String>) -> Self {
        OrderClause::new(field, Dir::Desc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_parse() {
        assert_eq!(Dir::parse("1"), Dir::Asc);
        assert_eq!(Dir::parse("asc"), Dir::Asc);
        assert_eq!(Dir::parse("ASC"), Dir::Asc);
        assert_eq!(Dir::parse("-1"), Dir::Desc);
        assert_eq!(Dir::parse("desc"), Dir::Desc);
        assert_eq!(Dir::parse("sideways"), Dir::Desc);
    }

    #[test]
    fn dir_signed() {
        assert_eq!(Dir::Asc.signed(), 1);
        assert_eq!(Dir::Desc.signed(), -1);
    }

    #[test]
    fn direction_keeps_raw_token() {
        let direction = Direction::new("asc");
        assert_eq!(direction.as_str(), "asc");
        assert_eq!(direction.dir(), Dir::Asc);
        assert_eq!(Direction::from(Dir::Desc).as_str(), "-1");
    }

    #[test]
    fn order_clause_constructors() {
        assert_eq!(OrderClause::asc("name").direction.dir(), Dir::Asc);
        assert_eq!(OrderClause::desc("age").direction.as_str(), "-1");
        assert_eq!(OrderClause::new("x", "desc").field, "x");
    }

    #[test]
    fn direction_serializes_transparently() {
        let clause = OrderClause::new("name", "1");
        let json = serde_json::to_string(&clause).unwrap();
        assert_eq!(json, r#"{"field":"name","direction":"1"}"#);
    }
}
