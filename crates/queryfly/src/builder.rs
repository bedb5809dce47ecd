//! Fluent query builder.
//!
//! A [`Builder`] accumulates the clauses for one request against a
//! collection. Methods mutate in place and return `&mut Self` so calls chain:
//!
//! ```
//! use queryfly::Builder;
//!
//! let mut users = Builder::new("users");
//! users
//!     .where_("age", ">=", 18)
//!     .where_in("role", ["admin", "editor"])
//!     .order_by("name", "asc")
//!     .limit(10);
//!
//! let request = users.compile().unwrap();
//! assert_eq!(request.path, "/users/query");
//! assert_eq!(request.query, "age=gte:18&role=in:admin,editor&_orderBy=name:1&_limit=10");
//! ```
//!
//! Compilation lives in [`crate::grammar`]; the cache key in [`crate::cache`].

use serde::{Serialize, Serializer};

use crate::clause::FilterClause;
use crate::error::{QueryError, Result};
use crate::grammar::{self, CompiledRequest};
use crate::op::Op;
use crate::ordering::Dir;
use crate::value::{Scalar, Value};

/// How a where clause joins the clauses before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Boolean {
    #[default]
    And,
    Or,
}

/// One recorded where clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Where {
    /// `column <operator> value`. The operator is kept as written.
    Basic {
        column: String,
        operator: String,
        value: Scalar,
        boolean: Boolean,
    },
    In {
        column: String,
        values: Vec<Scalar>,
        boolean: Boolean,
    },
    NotIn {
        column: String,
        values: Vec<Scalar>,
        boolean: Boolean,
    },
    Null {
        column: String,
        boolean: Boolean,
    },
    NotNull {
        column: String,
        boolean: Boolean,
    },
    Between {
        column: String,
        values: (Scalar, Scalar),
        boolean: Boolean,
        not: bool,
    },
    /// A parenthesised group. Recorded, but the wire grammar cannot carry it.
    ///
    /// Serializes as the group's where clauses only.
    Nested {
        #[serde(rename = "wheres", serialize_with = "nested_wheres")]
        query: Box<Builder>,
        boolean: Boolean,
    },
}

fn nested_wheres<S>(query: &Builder, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    query.get_wheres().serialize(serializer)
}

impl Where {
    /// The join for this clause.
    pub fn boolean(&self) -> Boolean {
        match self {
            Where::Basic { boolean, .. }
            | Where::In { boolean, .. }
            | Where::NotIn { boolean, .. }
            | Where::Null { boolean, .. }
            | Where::NotNull { boolean, .. }
            | Where::Between { boolean, .. }
            | Where::Nested { boolean, .. } => *boolean,
        }
    }

    /// The column, for every clause kind except nested groups.
    pub fn column(&self) -> Option<&str> {
        match self {
            Where::Basic { column, .. }
            | Where::In { column, .. }
            | Where::NotIn { column, .. }
            | Where::Null { column, .. }
            | Where::NotNull { column, .. }
            | Where::Between { column, .. } => Some(column),
            Where::Nested { .. } => None,
        }
    }
}

/// A pending aggregate call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Aggregate {
    pub function: String,
    pub columns: Vec<String>,
}

/// Accumulated state of one query against a collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Builder {
    from: String,
    columns: Option<Vec<String>>,
    wheres: Vec<Where>,
    groups: Vec<String>,
    orders: Vec<(String, i8)>,
    limit: Option<u64>,
    offset: Option<u64>,
    aggregate: Option<Aggregate>,
    distinct: bool,
    timeout: Option<u64>,
    hint: Option<String>,
    paginating: bool,
}

impl Builder {
    /// Creates an empty builder against a collection.
    pub fn new(collection: impl Into<String>) -> Self {
        Builder {
            from: collection.into(),
            ..Builder::default()
        }
    }

    /// Returns a fresh builder against the same collection.
    pub fn new_query(&self) -> Builder {
        Builder::new(self.from.clone())
    }

    /// Sets the target collection.
    pub fn from(&mut self, collection: impl Into<String>) -> &mut Self {
        self.from = collection.into();
        self
    }

    // ========================================================================
    // Projection and grouping
    // ========================================================================

    /// Replaces the requested columns.
    pub fn select<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Adds to the requested columns.
    pub fn add_select<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns
            .get_or_insert_with(Vec::new)
            .extend(columns.into_iter().map(Into::into));
        self
    }

    /// Marks the query distinct.
    pub fn distinct(&mut self) -> &mut Self {
        self.distinct = true;
        self
    }

    /// Marks the query distinct over a single column.
    pub fn distinct_on(&mut self, column: impl Into<String>) -> &mut Self {
        self.distinct = true;
        self.columns = Some(vec![column.into()]);
        self
    }

    pub fn group_by<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(columns.into_iter().map(Into::into));
        self
    }

    // ========================================================================
    // Where clauses
    // ========================================================================

    /// Adds `column <operator> value`, joined with `and`.
    ///
    /// The operator is kept as written: the structured spellings (`=`, `>=`,
    /// `not like`, ...) and `<>` compile to wire tokens, anything else is
    /// emitted verbatim.
    pub fn where_(
        &mut self,
        column: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Scalar>,
    ) -> &mut Self {
        self.push_basic(column, operator, value, Boolean::And)
    }

    /// Adds `column <operator> value`, joined with `or`.
    pub fn or_where(
        &mut self,
        column: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Scalar>,
    ) -> &mut Self {
        self.push_basic(column, operator, value, Boolean::Or)
    }

    pub fn where_in<I, V>(&mut self, column: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        self.wheres.push(Where::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            boolean: Boolean::And,
        });
        self
    }

    pub fn or_where_in<I, V>(&mut self, column: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        self.wheres.push(Where::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            boolean: Boolean::Or,
        });
        self
    }

    pub fn where_not_in<I, V>(&mut self, column: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        self.wheres.push(Where::NotIn {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            boolean: Boolean::And,
        });
        self
    }

    pub fn or_where_not_in<I, V>(&mut self, column: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        self.wheres.push(Where::NotIn {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            boolean: Boolean::Or,
        });
        self
    }

    pub fn where_null(&mut self, column: impl Into<String>) -> &mut Self {
        self.wheres.push(Where::Null {
            column: column.into(),
            boolean: Boolean::And,
        });
        self
    }

    pub fn or_where_null(&mut self, column: impl Into<String>) -> &mut Self {
        self.wheres.push(Where::Null {
            column: column.into(),
            boolean: Boolean::Or,
        });
        self
    }

    pub fn where_not_null(&mut self, column: impl Into<String>) -> &mut Self {
        self.wheres.push(Where::NotNull {
            column: column.into(),
            boolean: Boolean::And,
        });
        self
    }

    pub fn or_where_not_null(&mut self, column: impl Into<String>) -> &mut Self {
        self.wheres.push(Where::NotNull {
            column: column.into(),
            boolean: Boolean::Or,
        });
        self
    }

    /// Adds an inclusive range check.
    pub fn where_between(
        &mut self,
        column: impl Into<String>,
        low: impl Into<Scalar>,
        high: impl Into<Scalar>,
    ) -> &mut Self {
        self.push_between(column, (low.into(), high.into()), Boolean::And, false)
    }

    pub fn or_where_between(
        &mut self,
        column: impl Into<String>,
        low: impl Into<Scalar>,
        high: impl Into<Scalar>,
    ) -> &mut Self {
        self.push_between(column, (low.into(), high.into()), Boolean::Or, false)
    }

    pub fn where_not_between(
        &mut self,
        column: impl Into<String>,
        low: impl Into<Scalar>,
        high: impl Into<Scalar>,
    ) -> &mut Self {
        self.push_between(column, (low.into(), high.into()), Boolean::And, true)
    }

    /// Records a grouped clause built by `f`.
    ///
    /// Grouping has no wire representation: compiling a builder that holds
    /// one fails with [`QueryError::NotSupported`].
    pub fn where_nested<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(&mut Builder),
    {
        self.push_nested(f, Boolean::And)
    }

    pub fn or_where_nested<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(&mut Builder),
    {
        self.push_nested(f, Boolean::Or)
    }

    /// Records a structured filter clause as the matching where call.
    ///
    /// A `negated` clause records the operator's complement; a negated
    /// `between` becomes a not-between.
    pub fn add_clause(&mut self, clause: &FilterClause) -> Result<&mut Self> {
        let op = if clause.negated && !clause.op.is_range() {
            clause.op.negate().unwrap_or(clause.op)
        } else {
            clause.op
        };
        let field = clause.field.clone();

        match (op, &clause.value) {
            (Op::Between, Value::Pair(lo, hi)) => {
                Ok(self.push_between(field, (lo.clone(), hi.clone()), Boolean::And, clause.negated))
            }
            (Op::In, value) => Ok(self.where_in(field, value.clone().into_list())),
            (Op::NotIn, value) => Ok(self.where_not_in(field, value.clone().into_list())),
            (op, Value::Scalar(value)) if !op.is_range() => {
                Ok(self.where_(field, op.symbol(), value.clone()))
            }
            (op, value) => Err(QueryError::InvalidArity {
                op,
                expected: if op.is_range() { "exactly 2" } else { "exactly 1" },
                actual: value.arity(),
            }),
        }
    }

    // ========================================================================
    // Ordering and paging
    // ========================================================================

    /// Orders by a column.
    ///
    /// `asc` (any case) and `1` sort ascending, everything else descending.
    /// The column `natural` orders by natural storage order. Ordering the
    /// same column twice keeps its first position with the later direction.
    pub fn order_by(&mut self, column: impl Into<String>, direction: &str) -> &mut Self {
        self.order_by_dir(column, Dir::parse(direction))
    }

    pub fn order_by_dir(&mut self, column: impl Into<String>, dir: Dir) -> &mut Self {
        let mut column = column.into();
        if column == "natural" {
            column = "$natural".to_string();
        }
        let signed = dir.signed();
        match self.orders.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => *existing = signed,
            None => self.orders.push((column, signed)),
        }
        self
    }

    pub fn order_asc(&mut self, column: impl Into<String>) -> &mut Self {
        self.order_by_dir(column, Dir::Asc)
    }

    pub fn order_desc(&mut self, column: impl Into<String>) -> &mut Self {
        self.order_by_dir(column, Dir::Desc)
    }

    pub fn limit(&mut self, n: u64) -> &mut Self {
        self.limit = Some(n);
        self
    }

    /// Alias for [`limit`](Self::limit).
    pub fn take(&mut self, n: u64) -> &mut Self {
        self.limit(n)
    }

    pub fn offset(&mut self, n: u64) -> &mut Self {
        self.offset = Some(n);
        self
    }

    /// Alias for [`offset`](Self::offset).
    pub fn skip(&mut self, n: u64) -> &mut Self {
        self.offset(n)
    }

    /// Selects one page of `per_page` results. Pages start at 1.
    pub fn for_page(&mut self, page: u64, per_page: u64) -> &mut Self {
        self.paginating = true;
        self.skip(page.saturating_sub(1).saturating_mul(per_page))
            .take(per_page)
    }

    // ========================================================================
    // Cursor options and aggregates
    // ========================================================================

    /// Sets the cursor timeout in seconds. Passed through to the service.
    pub fn timeout(&mut self, seconds: u64) -> &mut Self {
        self.timeout = Some(seconds);
        self
    }

    /// Sets the cursor index hint. Passed through to the service.
    pub fn hint(&mut self, index: impl Into<String>) -> &mut Self {
        self.hint = Some(index.into());
        self
    }

    /// Records an aggregate call such as `count` or `max`.
    pub fn aggregate<I, S>(&mut self, function: impl Into<String>, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aggregate = Some(Aggregate {
            function: function.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Drops the aggregate and the column selection.
    pub fn clear_aggregate(&mut self) -> &mut Self {
        self.aggregate = None;
        self.columns = None;
        self
    }

    /// Constrains the query to the record with the given id.
    pub fn find(&mut self, id: impl Into<Scalar>) -> &mut Self {
        self.where_("id", "=", id).limit(1)
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Compiles the builder into a select request.
    pub fn compile(&self) -> Result<CompiledRequest> {
        grammar::compile_select(self)
    }

    /// Digest identifying this query's logical content.
    pub fn generate_cache_key(&self) -> Result<String> {
        crate::cache::generate_cache_key(self)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn collection(&self) -> &str {
        &self.from
    }

    pub fn get_columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    pub fn get_wheres(&self) -> &[Where] {
        &self.wheres
    }

    pub fn get_groups(&self) -> &[String] {
        &self.groups
    }

    /// Column and signed direction pairs, in first-ordered sequence.
    pub fn get_orders(&self) -> &[(String, i8)] {
        &self.orders
    }

    pub fn get_limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn get_offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn get_aggregate(&self) -> Option<&Aggregate> {
        self.aggregate.as_ref()
    }

    pub fn get_timeout(&self) -> Option<u64> {
        self.timeout
    }

    pub fn get_hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn is_paginating(&self) -> bool {
        self.paginating
    }

    fn push_basic(
        &mut self,
        column: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Scalar>,
        boolean: Boolean,
    ) -> &mut Self {
        self.wheres.push(Where::Basic {
            column: column.into(),
            operator: operator.into(),
            value: value.into(),
            boolean,
        });
        self
    }

    fn push_between(
        &mut self,
        column: impl Into<String>,
        values: (Scalar, Scalar),
        boolean: Boolean,
        not: bool,
    ) -> &mut Self {
        self.wheres.push(Where::Between {
            column: column.into(),
            values,
            boolean,
            not,
        });
        self
    }

    fn push_nested<F>(&mut self, f: F, boolean: Boolean) -> &mut Self
    where
        F: FnOnce(&mut Builder),
    {
        let mut nested = self.new_query();
        f(&mut nested);
        self.wheres.push(Where::Nested {
            query: Box::new(nested),
            boolean,
        });
        self
    }
}
