//! Queryfly - a query-string filter language for REST collections.
//!
//! One grammar, two directions:
//!
//! - **Parsing** turns an incoming query string such as
//!   `age=gte:18&_orderBy=name:1&_limit=10` into a [`StructuredQuery`].
//! - **Compiling** turns a fluent [`Builder`] into the canonical query string
//!   and request path a data service understands.
//!
//! [`bind`] connects the two: it applies a parsed query onto any
//! [`QueryTarget`] (the [`Builder`] is one), checking the requested
//! projection against a [`ColumnCatalog`] when one is given.
//!
//! # Quick Start
//!
//! ```rust
//! use queryfly::{bind, parse_query_string, Builder};
//!
//! let query = parse_query_string("age=gte:18&role=in:admin,editor&_orderBy=name:1&_limit=10");
//!
//! let mut users = Builder::new("users");
//! let bound = bind(&query, &mut users, None).unwrap();
//! assert_eq!(bound.projection, vec!["*"]);
//!
//! let request = users.compile().unwrap();
//! assert_eq!(
//!     request.url(),
//!     "/users/query?age=gte:18&role=in:admin,editor&_orderBy=name:1&_limit=10"
//! );
//! ```
//!
//! # Wire Grammar
//!
//! | Key | Value | Meaning |
//! |-----|-------|---------|
//! | `<field>` | `<op>:<value>` | filter; repeat the key for several conditions |
//! | `<field>` | `in:<a>,<b>` / `!in:<a>,<b>` | set membership |
//! | `<field>` | `between:<lo>,<hi>` | inclusive range |
//! | `_orderBy` | `<field>:<dir>[,...]` | ordering |
//! | `_field` | `<a>,<b>` | projection |
//! | `_limit`, `_offset` | `<n>` | paging |
//! | `_null`, `_notnull` | `<a>,<b>` | null checks |
//!
//! Values are percent-encoded per element, so `,` and `:` inside a value
//! travel as `%2C` and `%3A`. [`parse_query_string`] splits before decoding
//! and keeps them inside their element.
//!
//! Operators: `eq`, `!eq`, `lt`, `lte`, `gt`, `gte`, `like`, `!like`,
//! `between`, `in`, `!in`. See [`Op`].
//!
//! Parsing never fails; fragments it cannot read are dropped and reported by
//! [`parse_with_diagnostics`]. Compiling fails only for clause shapes the
//! grammar cannot carry, such as nested groups.

mod binder;
mod builder;
mod cache;
mod clause;
mod error;
pub mod grammar;
mod op;
mod ordering;
mod parser;
mod query;
mod value;

pub use binder::{bind, validate_projection, Bound, ColumnCatalog, QueryTarget};
pub use builder::{Aggregate, Boolean, Builder, Where};
pub use cache::generate_cache_key;
pub use clause::FilterClause;
pub use error::{QueryError, Result};
pub use grammar::{compile_insert, compile_select, CompiledRequest};
pub use op::{compile_operator, from_wire, to_wire, Op};
pub use ordering::{Dir, Direction, OrderClause};
pub use parser::{
    parse, parse_query_string, parse_query_string_with_diagnostics, parse_with_diagnostics, DropReason, MalformedFragment, OneOrMany,
    Parsed, QueryParams,
};
pub use query::{Directive, DirectiveKind, StructuredQuery};
pub use value::{Scalar, Value};
