//! Applying a structured query onto a live query object.
//!
//! [`bind`] walks a [`StructuredQuery`] and calls the matching capability of
//! a [`QueryTarget`] for every clause, in recorded order. The projection is
//! never applied to the target; it is handed back in [`Bound`], optionally
//! checked against a [`ColumnCatalog`] first.

use std::collections::{BTreeSet, HashMap};

use crate::builder::Builder;
use crate::clause::FilterClause;
use crate::error::{QueryError, Result};
use crate::grammar::is_wildcard;
use crate::ordering::Direction;
use crate::query::{DirectiveKind, StructuredQuery};

/// The capabilities [`bind`] needs from a query object.
pub trait QueryTarget {
    /// Collection the target queries, used for projection checks.
    fn collection(&self) -> &str;

    /// Adds one filter clause.
    fn add_filter(&mut self, clause: &FilterClause) -> Result<()>;

    /// Adds one ordering.
    fn add_order(&mut self, field: &str, direction: &Direction);

    fn set_limit(&mut self, n: u64);

    fn set_offset(&mut self, n: u64);

    /// Requires `field` to be null, or non-null when `not` is set.
    fn add_null(&mut self, field: &str, not: bool);
}

impl QueryTarget for Builder {
    fn collection(&self) -> &str {
        Builder::collection(self)
    }

    fn add_filter(&mut self, clause: &FilterClause) -> Result<()> {
        self.add_clause(clause).map(|_| ())
    }

    fn add_order(&mut self, field: &str, direction: &Direction) {
        self.order_by_dir(field, direction.dir());
    }

    fn set_limit(&mut self, n: u64) {
        self.limit(n);
    }

    fn set_offset(&mut self, n: u64) {
        self.offset(n);
    }

    fn add_null(&mut self, field: &str, not: bool) {
        if not {
            self.where_not_null(field);
        } else {
            self.where_null(field);
        }
    }
}

/// Lists the known columns of a collection.
pub trait ColumnCatalog {
    fn list_columns(&self, collection: &str) -> BTreeSet<String>;
}

impl<F> ColumnCatalog for F
where
    F: Fn(&str) -> BTreeSet<String>,
{
    fn list_columns(&self, collection: &str) -> BTreeSet<String> {
        self(collection)
    }
}

/// One column set shared by every collection.
impl ColumnCatalog for BTreeSet<String> {
    fn list_columns(&self, _collection: &str) -> BTreeSet<String> {
        self.clone()
    }
}

/// Column sets per collection; unknown collections have no columns.
impl ColumnCatalog for HashMap<String, BTreeSet<String>> {
    fn list_columns(&self, collection: &str) -> BTreeSet<String> {
        self.get(collection).cloned().unwrap_or_default()
    }
}

/// The result of a bind: the mutated target and the requested projection.
#[derive(Debug)]
pub struct Bound<'t, T> {
    pub target: &'t mut T,
    /// Requested columns; `["*"]` when the query set none.
    pub projection: Vec<String>,
}

/// Applies `query` onto `target`.
///
/// Filters, then orderings, then directives, each in recorded order. `limit`
/// and `offset` values that are not unsigned integers are skipped; `null` and
/// `notnull` apply to each comma-separated field; `where` is kept on the
/// query and not applied.
///
/// With a `catalog`, a projection without `*` is checked before the target
/// is touched (one naming `*` compiles to no `field` directive at all): any column missing from the collection fails the bind
/// with [`QueryError::InvalidProjection`] naming every missing column.
pub fn bind<'t, T: QueryTarget>(
    query: &StructuredQuery,
    target: &'t mut T,
    catalog: Option<&dyn ColumnCatalog>,
) -> Result<Bound<'t, T>> {
    let projection = query.select();
    if let Some(catalog) = catalog {
        if !is_wildcard(&projection) {
            validate_projection(target.collection(), &projection, catalog)?;
        }
    }

    for clause in &query.filters {
        tracing::debug!(field = %clause.field, op = %clause.op, "binding filter");
        target.add_filter(clause)?;
    }

    for order in &query.orders {
        tracing::debug!(field = %order.field, direction = %order.direction, "binding order");
        target.add_order(&order.field, &order.direction);
    }

    for directive in &query.directives {
        match directive.kind {
            DirectiveKind::Limit => match query.get_limit() {
                Some(n) => target.set_limit(n),
                None => skip_directive(directive.kind, &directive.value),
            },
            DirectiveKind::Offset => match query.get_offset() {
                Some(n) => target.set_offset(n),
                None => skip_directive(directive.kind, &directive.value),
            },
            DirectiveKind::Null | DirectiveKind::NotNull => {
                let not = directive.kind == DirectiveKind::NotNull;
                for field in directive.value.split(',').filter(|f| !f.is_empty()) {
                    target.add_null(field, not);
                }
            }
            DirectiveKind::Where => skip_directive(directive.kind, &directive.value),
        }
    }

    Ok(Bound { target, projection })
}

/// Checks `columns` against the collection's known columns.
pub fn validate_projection(
    collection: &str,
    columns: &[String],
    catalog: &dyn ColumnCatalog,
) -> Result<()> {
    let known = catalog.list_columns(collection);
    let unknown: Vec<String> = columns
        .iter()
        .filter(|c| !known.contains(c.as_str()))
        .cloned()
        .collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(QueryError::InvalidProjection {
            collection: collection.to_string(),
            columns: unknown,
        })
    }
}

fn skip_directive(kind: DirectiveKind, value: &str) {
    tracing::debug!(directive = %kind, value = %value, "directive not applied");
}
