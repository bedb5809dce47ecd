//! Clause compiler.
//!
//! Serializes a [`Builder`] into the service's query-string grammar. A select
//! compiles its components in a fixed order and joins the non-empty ones
//! with `&`:
//!
//! ```text
//! aggregate, columns, joins, wheres, orders, limit, offset, unions, lock, timeout, hint
//! ```
//!
//! Joins, unions and lock have no wire form and always compile empty.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::builder::{Boolean, Builder, Where};
use crate::error::{QueryError, Result};
use crate::op::compile_operator;
use crate::value::Scalar;

/// Bytes left unescaped in values: ASCII alphanumerics and `-_.~`.
const VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A compiled request: path, query string and optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRequest {
    /// `/{collection}/{operation}`.
    pub path: String,
    /// Query string without the leading `?`; may be empty.
    pub query: String,
    /// Body for write operations.
    pub body: Option<serde_json::Value>,
}

impl CompiledRequest {
    /// The path with the query string appended, when there is one.
    pub fn url(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query)
        }
    }
}

/// Builds `/{collection}/{operation}`.
pub fn request_path(collection: &str, operation: &str) -> String {
    format!("/{collection}/{operation}")
}

/// Compiles a builder into a select request against `/{collection}/query`.
///
/// Fails with [`QueryError::NotSupported`] if any where clause is a nested
/// group; nothing is returned in that case.
pub fn compile_select(builder: &Builder) -> Result<CompiledRequest> {
    let segments = [
        compile_aggregate(builder),
        compile_columns(builder),
        String::new(), // joins
        compile_wheres(builder)?,
        compile_orders(builder),
        compile_limit(builder),
        compile_offset(builder),
        String::new(), // unions
        String::new(), // lock
        compile_timeout(builder),
        compile_hint(builder),
    ];

    let request = CompiledRequest {
        path: request_path(builder.collection(), "query"),
        query: concatenate(&segments),
        body: None,
    };
    tracing::trace!(path = %request.path, query = %request.query, "compiled select");
    Ok(request)
}

/// Compiles an insert of `values` into `/{collection}/insert`.
pub fn compile_insert(builder: &Builder, values: &serde_json::Value) -> CompiledRequest {
    let request = CompiledRequest {
        path: request_path(builder.collection(), "insert"),
        query: String::new(),
        body: Some(values.clone()),
    };
    tracing::trace!(path = %request.path, "compiled insert");
    request
}

/// Joins segments with `&`, skipping empty ones.
pub fn concatenate<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(AsRef::as_ref)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-encodes one value.
pub fn encode_value(value: &Scalar) -> String {
    utf8_percent_encode(&value.to_string(), VALUE).to_string()
}

fn encode_list<'a, I>(values: I) -> String
where
    I: IntoIterator<Item = &'a Scalar>,
{
    values
        .into_iter()
        .map(encode_value)
        .collect::<Vec<_>>()
        .join(",")
}

// ============================================================================
// Components
// ============================================================================

/// `_aggregate=<function>[:<columns>]`.
pub fn compile_aggregate(builder: &Builder) -> String {
    let Some(aggregate) = builder.get_aggregate() else {
        return String::new();
    };
    if is_wildcard(&aggregate.columns) {
        format!("_aggregate={}", aggregate.function)
    } else {
        format!(
            "_aggregate={}:{}",
            aggregate.function,
            aggregate.columns.join(",")
        )
    }
}

/// `field=<columns>`; empty when unset or when `*` is requested.
pub fn compile_columns(builder: &Builder) -> String {
    match builder.get_columns() {
        Some(columns) if !is_wildcard(columns) => format!("field={}", columns.join(",")),
        _ => String::new(),
    }
}

/// Every where clause in order.
pub fn compile_wheres(builder: &Builder) -> Result<String> {
    let mut compiled = Vec::with_capacity(builder.get_wheres().len());
    for clause in builder.get_wheres() {
        let rule = compile_where(builder.collection(), clause)?;
        let marker = match clause.boolean() {
            Boolean::And => "",
            Boolean::Or => "!",
        };
        compiled.push(format!("{marker}{rule}"));
    }
    Ok(compiled.join("&"))
}

fn compile_where(collection: &str, clause: &Where) -> Result<String> {
    let rule = match clause {
        Where::Basic {
            column,
            operator,
            value,
            ..
        } => format!(
            "{}={}:{}",
            strip_collection(collection, column),
            compile_operator(operator),
            encode_value(value)
        ),
        Where::In { column, values, .. } => format!(
            "{}=in:{}",
            strip_collection(collection, column),
            encode_list(values)
        ),
        Where::NotIn { column, values, .. } => format!(
            "{}=nin:{}",
            strip_collection(collection, column),
            encode_list(values)
        ),
        Where::Null { column, .. } => format!("{}=null", strip_collection(collection, column)),
        Where::NotNull { column, .. } => {
            format!("{}=!null", strip_collection(collection, column))
        }
        Where::Between {
            column,
            values: (low, high),
            not,
            ..
        } => format!(
            "{}={}between:{},{}",
            strip_collection(collection, column),
            if *not { "!" } else { "" },
            encode_value(low),
            encode_value(high)
        ),
        Where::Nested { .. } => {
            return Err(QueryError::NotSupported(
                "nested where clauses have no query-string form".to_string(),
            ))
        }
    };
    Ok(rule)
}

/// `_orderBy=<field>:<1|-1>[,...]`.
pub fn compile_orders(builder: &Builder) -> String {
    let orders = builder.get_orders();
    if orders.is_empty() {
        return String::new();
    }
    let rendered: Vec<String> = orders
        .iter()
        .map(|(column, dir)| {
            format!("{}:{}", strip_collection(builder.collection(), column), dir)
        })
        .collect();
    format!("_orderBy={}", rendered.join(","))
}

pub fn compile_limit(builder: &Builder) -> String {
    builder
        .get_limit()
        .map(|n| format!("_limit={n}"))
        .unwrap_or_default()
}

pub fn compile_offset(builder: &Builder) -> String {
    builder
        .get_offset()
        .map(|n| format!("_offset={n}"))
        .unwrap_or_default()
}

fn compile_timeout(builder: &Builder) -> String {
    builder
        .get_timeout()
        .map(|n| format!("_timeout={n}"))
        .unwrap_or_default()
}

fn compile_hint(builder: &Builder) -> String {
    builder
        .get_hint()
        .map(|hint| format!("_hint={}", utf8_percent_encode(hint, VALUE)))
        .unwrap_or_default()
}

fn strip_collection<'a>(collection: &str, column: &'a str) -> &'a str {
    column
        .strip_prefix(collection)
        .and_then(|rest| rest.strip_prefix('.'))
        .filter(|_| !collection.is_empty())
        .unwrap_or(column)
}

/// Whether a column list means "every column": empty, or naming `*`.
pub(crate) fn is_wildcard(columns: &[String]) -> bool {
    columns.is_empty() || columns.iter().any(|c| c == "*")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Builder {
        Builder::new("users")
    }

    #[test]
    fn empty_builder_compiles_to_bare_path() {
        let request = compile_select(&users()).unwrap();
        assert_eq!(request.path, "/users/query");
        assert_eq!(request.query, "");
        assert_eq!(request.url(), "/users/query");
    }

    #[test]
    fn filters_come_before_limit() {
        let mut builder = users();
        builder.where_("age", ">=", "18").limit(10);
        let request = compile_select(&builder).unwrap();
        assert_eq!(request.query, "age=gte:18&_limit=10");
        assert_eq!(request.url(), "/users/query?age=gte:18&_limit=10");
    }

    #[test]
    fn operator_conversion() {
        let mut builder = users();
        builder
            .where_("a", "=", 1)
            .where_("b", "!=", 2)
            .where_("c", "<>", 3)
            .where_("d", "not like", "x")
            .where_("e", "regexp", "y");
        let query = compile_wheres(&builder).unwrap();
        assert_eq!(query, "a=eq:1&b=!eq:2&c=eq:3&d=!like:x&e=regexp:y");
    }

    #[test]
    fn or_join_prefixes_bang() {
        let mut builder = users();
        builder.where_("a", "=", 1).or_where("b", "=", 2).or_where_null("c");
        assert_eq!(compile_wheres(&builder).unwrap(), "a=eq:1&!b=eq:2&!c=null");
    }

    #[test]
    fn values_are_percent_encoded() {
        let mut builder = users();
        builder
            .where_("name", "like", "John Doe%")
            .where_("email", "=", "a+b@x.io")
            .where_("tag", "=", "x-y_z.~");
        assert_eq!(
            compile_wheres(&builder).unwrap(),
            "name=like:John%20Doe%25&email=eq:a%2Bb%40x.io&tag=eq:x-y_z.~"
        );
    }

    #[test]
    fn list_elements_encoded_individually() {
        let mut builder = users();
        builder
            .where_in("city", ["New York", "a,b"])
            .where_not_in("id", [1, 2]);
        assert_eq!(
            compile_wheres(&builder).unwrap(),
            "city=in:New%20York,a%2Cb&id=nin:1,2"
        );
    }

    #[test]
    fn null_and_between_rules() {
        let mut builder = users();
        builder
            .where_null("deleted_at")
            .where_not_null("email")
            .where_between("age", 18, 65)
            .where_not_between("score", 1.5, "9 9");
        assert_eq!(
            compile_wheres(&builder).unwrap(),
            "deleted_at=null&email=!null&age=between:18,65&score=!between:1.5,9%209"
        );
    }

    #[test]
    fn collection_qualifier_is_stripped() {
        let mut builder = users();
        builder
            .where_("users.age", "=", 1)
            .where_("usersx.age", "=", 2)
            .where_("other.users.age", "=", 3)
            .order_asc("users.name");
        let request = compile_select(&builder).unwrap();
        assert_eq!(
            request.query,
            "age=eq:1&usersx.age=eq:2&other.users.age=eq:3&_orderBy=name:1"
        );
    }

    #[test]
    fn nested_fails_without_output() {
        let mut builder = users();
        builder.where_("a", "=", 1).where_nested(|q| {
            q.where_("b", "=", 2);
        });
        let err = compile_select(&builder).unwrap_err();
        assert!(matches!(err, QueryError::NotSupported(_)));
    }

    #[test]
    fn columns_omitted_for_wildcard() {
        let mut builder = users();
        builder.select(["*"]);
        assert_eq!(compile_columns(&builder), "");

        builder.select(["name", "*"]);
        assert_eq!(compile_columns(&builder), "");

        builder.select(Vec::<String>::new());
        assert_eq!(compile_columns(&builder), "");

        builder.select(["name", "age"]);
        assert_eq!(compile_columns(&builder), "field=name,age");
    }

    #[test]
    fn aggregate_segment() {
        let mut builder = users();
        builder.aggregate("count", ["*"]);
        assert_eq!(compile_aggregate(&builder), "_aggregate=count");

        builder.aggregate("max", ["age"]);
        assert_eq!(compile_aggregate(&builder), "_aggregate=max:age");
    }

    #[test]
    fn full_component_order() {
        let mut builder = users();
        builder
            .select(["name"])
            .aggregate("sum", ["score"])
            .where_("age", ">", 1)
            .order_by("natural", "desc")
            .offset(20)
            .limit(10)
            .timeout(30)
            .hint("age_1");
        let request = compile_select(&builder).unwrap();
        assert_eq!(
            request.query,
            "_aggregate=sum:score&field=name&age=gt:1&_orderBy=$natural:-1&_limit=10&_offset=20&_timeout=30&_hint=age_1"
        );
    }

    #[test]
    fn insert_request() {
        let body = serde_json::json!({"name": "x"});
        let request = compile_insert(&users(), &body);
        assert_eq!(request.path, "/users/insert");
        assert_eq!(request.url(), "/users/insert");
        assert_eq!(request.body, Some(body));
    }

    #[test]
    fn concatenate_skips_empty() {
        assert_eq!(concatenate(&["", "a=1", "", "b=2", ""]), "a=1&b=2");
        assert_eq!(concatenate::<&str>(&[]), "");
    }
}
