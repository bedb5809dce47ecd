//! The structured query.
//!
//! [`StructuredQuery`] is the representation both transforms share: the parser
//! produces one, the binder applies one onto a [`QueryTarget`](crate::QueryTarget).
//! It is a plain value; build a fresh one per query.

use serde::{Deserialize, Serialize};

use crate::clause::FilterClause;
use crate::ordering::OrderClause;

/// A non-filter directive recognised by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectiveKind {
    /// Maximum number of results.
    Limit,
    /// Number of results to skip.
    Offset,
    /// Raw where expression. Stored, never applied.
    Where,
    /// Comma-separated fields that must be non-null.
    NotNull,
    /// Comma-separated fields that must be null.
    Null,
}

impl DirectiveKind {
    pub const ALL: [DirectiveKind; 5] = [
        DirectiveKind::Limit,
        DirectiveKind::Offset,
        DirectiveKind::Where,
        DirectiveKind::NotNull,
        DirectiveKind::Null,
    ];

    /// Looks up a directive by its lowercased name (without the `_` prefix).
    pub fn from_name(name: &str) -> Option<DirectiveKind> {
        DirectiveKind::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DirectiveKind::Limit => "limit",
            DirectiveKind::Offset => "offset",
            DirectiveKind::Where => "where",
            DirectiveKind::NotNull => "notnull",
            DirectiveKind::Null => "null",
        }
    }
}

impl std::fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directive and its raw value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub kind: DirectiveKind,
    pub value: String,
}

/// Filters, orderings, projection and directives of one query.
///
/// # Example
///
/// ```
/// use queryfly::{FilterClause, Op, OrderClause, StructuredQuery};
///
/// let query = StructuredQuery::new()
///     .filter(FilterClause::new("age", Op::Gte, "18").unwrap())
///     .order(OrderClause::asc("name"))
///     .limit(10);
///
/// assert_eq!(query.get_limit(), Some(10));
/// assert_eq!(query.select(), vec!["*"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredQuery {
    /// Filter clauses in encounter order.
    #[serde(default)]
    pub filters: Vec<FilterClause>,
    /// Ordering clauses in encounter order.
    #[serde(default)]
    pub orders: Vec<OrderClause>,
    /// Requested output columns; `None` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<Vec<String>>,
    /// Directives, one per kind.
    #[serde(default)]
    pub directives: Vec<Directive>,
}

impl StructuredQuery {
    /// Creates an empty query.
    pub fn new() -> Self {
        StructuredQuery::default()
    }

    // ========================================================================
    // Builders
    // ========================================================================

    /// Appends a filter clause.
    pub fn filter(mut self, clause: FilterClause) -> Self {
        self.push_filter(clause);
        self
    }

    /// Appends an ordering clause.
    pub fn order(mut self, clause: OrderClause) -> Self {
        self.push_order(clause);
        self
    }

    /// Sets the projection.
    pub fn project<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_projection(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the limit directive.
    pub fn limit(mut self, n: u64) -> Self {
        self.set_directive(DirectiveKind::Limit, n.to_string());
        self
    }

    /// Sets the offset directive.
    pub fn offset(mut self, n: u64) -> Self {
        self.set_directive(DirectiveKind::Offset, n.to_string());
        self
    }

    // ========================================================================
    // In-place mutation
    // ========================================================================

    pub fn push_filter(&mut self, clause: FilterClause) {
        self.filters.push(clause);
    }

    pub fn push_order(&mut self, clause: OrderClause) {
        self.orders.push(clause);
    }

    /// Replaces the projection.
    pub fn set_projection(&mut self, fields: Vec<String>) {
        self.projection = Some(fields);
    }

    /// Stores a directive value.
    ///
    /// A later value for the same kind replaces the earlier one in place.
    pub fn set_directive(&mut self, kind: DirectiveKind, value: impl Into<String>) {
        let value = value.into();
        match self.directives.iter_mut().find(|d| d.kind == kind) {
            Some(existing) => existing.value = value,
            None => self.directives.push(Directive { kind, value }),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Returns the raw value of a directive.
    pub fn directive(&self, kind: DirectiveKind) -> Option<&str> {
        self.directives
            .iter()
            .find(|d| d.kind == kind)
            .map(|d| d.value.as_str())
    }

    /// Returns the limit, if set to a valid unsigned integer.
    pub fn get_limit(&self) -> Option<u64> {
        self.directive(DirectiveKind::Limit)
            .and_then(|v| v.trim().parse().ok())
    }

    /// Returns the offset, if set to a valid unsigned integer.
    pub fn get_offset(&self) -> Option<u64> {
        self.directive(DirectiveKind::Offset)
            .and_then(|v| v.trim().parse().ok())
    }

    /// Returns the requested columns, or `["*"]` when no projection is set.
    pub fn select(&self) -> Vec<String> {
        match &self.projection {
            Some(fields) => fields.clone(),
            None => vec!["*".to_string()],
        }
    }

    /// Returns `true` if the query carries nothing at all.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
            && self.orders.is_empty()
            && self.projection.is_none()
            && self.directives.is_empty()
    }
}
