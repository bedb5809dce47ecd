//! Query-string parser.
//!
//! Turns a flat key/value mapping such as
//! `age=gte:18&age=lt:65&_orderBy=name:1&_limit=10` into a
//! [`StructuredQuery`].
//!
//! Keys starting with `_` (followed by at least one non-`_` character) are
//! directives; every other key is a field name whose values are `op:value`
//! conditions. Parsing is total: fragments that cannot be understood are
//! dropped and reported through [`parse_with_diagnostics`], never rejected.

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::clause::FilterClause;
use crate::op::Op;
use crate::ordering::OrderClause;
use crate::query::{DirectiveKind, StructuredQuery};
use crate::value::{Scalar, Value};

static DIRECTIVE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^_[^_]+").expect("valid directive regex"));

// ============================================================================
// Input
// ============================================================================

/// A single value or, for repeated keys, every value in encounter order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    /// Iterates the values in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            OneOrMany::One(value) => std::slice::from_ref(value),
            OneOrMany::Many(values) => values,
        };
        slice.iter().map(String::as_str)
    }

    /// Returns the first value.
    pub fn first(&self) -> Option<&str> {
        self.iter().next()
    }

    /// Appends a value, turning a single value into a list.
    pub fn push(&mut self, value: String) {
        match self {
            OneOrMany::One(existing) => {
                let existing = std::mem::take(existing);
                *self = OneOrMany::Many(vec![existing, value]);
            }
            OneOrMany::Many(values) => values.push(value),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            OneOrMany::One(_) => 1,
            OneOrMany::Many(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for OneOrMany {
    fn from(value: &str) -> Self {
        OneOrMany::One(value.to_string())
    }
}

impl From<String> for OneOrMany {
    fn from(value: String) -> Self {
        OneOrMany::One(value)
    }
}

impl From<Vec<String>> for OneOrMany {
    fn from(values: Vec<String>) -> Self {
        OneOrMany::Many(values)
    }
}

impl From<Vec<&str>> for OneOrMany {
    fn from(values: Vec<&str>) -> Self {
        OneOrMany::Many(values.into_iter().map(String::from).collect())
    }
}

/// Decoded query parameters, in the order their keys first appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, OneOrMany)>,
}

impl QueryParams {
    pub fn new() -> Self {
        QueryParams::default()
    }

    /// Decodes a raw query string.
    ///
    /// `+` decodes to a space and percent escapes are resolved. A leading `?`
    /// is ignored. Repeated keys collect into a list.
    pub fn from_query_string(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        url::form_urlencoded::parse(raw.as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    /// Collects key/value pairs; repeated keys collect into a list.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect()
    }

    /// Sets the value for a key, replacing anything already there.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<OneOrMany>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Adds a value for a key, keeping earlier values.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => existing.push(value),
            None => self.entries.push((key, OneOrMany::One(value))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&OneOrMany> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OneOrMany)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (key, value) in iter {
            params.append(key, value);
        }
        params
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Why a fragment was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Condition has no `op:` prefix.
    MissingOperator,
    /// Operator token is not in the operator table.
    UnknownOperator(String),
    /// `between` value did not split into exactly two bounds.
    BetweenArity(usize),
    /// Ordering segment has no `:direction`.
    MissingDirection,
    /// Directive name is not recognised.
    UnknownDirective(String),
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DropReason::MissingOperator => f.write_str("missing operator"),
            DropReason::UnknownOperator(op) => write!(f, "unknown operator '{op}'"),
            DropReason::BetweenArity(n) => write!(f, "between needs 2 bounds, got {n}"),
            DropReason::MissingDirection => f.write_str("missing direction"),
            DropReason::UnknownDirective(name) => write!(f, "unknown directive '{name}'"),
        }
    }
}

/// A fragment the parser skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedFragment {
    pub key: String,
    pub fragment: String,
    pub reason: DropReason,
}

/// Parser output with the fragments that were skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parsed {
    pub query: StructuredQuery,
    pub dropped: Vec<MalformedFragment>,
    /// Field keys that carried a leading `!`.
    ///
    /// The prefix is stripped and has no effect on the emitted clauses.
    pub negated_keys: Vec<String>,
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses decoded parameters into a structured query.
pub fn parse(params: &QueryParams) -> StructuredQuery {
    parse_with_diagnostics(params).query
}

/// Parses a raw query string.
///
/// Values are split on `:` and `,` before they are percent-decoded, so an
/// escaped comma (`%2C`) inside an `in` element stays part of that element.
pub fn parse_query_string(raw: &str) -> StructuredQuery {
    parse_query_string_with_diagnostics(raw).query
}

/// Parses a raw query string, also reporting what was dropped.
pub fn parse_query_string_with_diagnostics(raw: &str) -> Parsed {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    let params: QueryParams = raw
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), value.to_string())
        })
        .collect();
    run(&params, true)
}

/// Parses decoded parameters, also reporting what was dropped.
pub fn parse_with_diagnostics(params: &QueryParams) -> Parsed {
    run(params, false)
}

fn run(params: &QueryParams, encoded: bool) -> Parsed {
    let mut parser = Parser {
        out: Parsed::default(),
        encoded,
    };
    for (key, values) in params.iter() {
        parser.key(key, values);
    }
    parser.out
}

/// Form decoding of one component: `+` is a space, escapes are resolved.
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

struct Parser {
    out: Parsed,
    /// Values are still percent-encoded and get decoded piece by piece.
    encoded: bool,
}

impl Parser {
    fn text(&self, piece: &str) -> String {
        if self.encoded {
            decode_component(piece)
        } else {
            piece.to_string()
        }
    }

    fn key(&mut self, key: &str, values: &OneOrMany) {
        let key = match key.strip_prefix('!') {
            Some(stripped) => {
                tracing::debug!(key = %stripped, "ignoring '!' prefix on key");
                self.out.negated_keys.push(stripped.to_string());
                stripped
            }
            None => key,
        };

        if DIRECTIVE_KEY.is_match(key) {
            let name = key[1..].to_lowercase();
            for value in values.iter() {
                self.directive(key, &name, value);
            }
        } else {
            for value in values.iter() {
                self.condition(key, value);
            }
        }
    }

    fn directive(&mut self, key: &str, name: &str, value: &str) {
        match name {
            "orderby" => {
                for segment in value.split(',') {
                    let mut parts = segment.split(':');
                    match (parts.next(), parts.next()) {
                        (Some(field), Some(direction)) => {
                            let order = OrderClause::new(self.text(field), self.text(direction));
                            self.out.query.push_order(order);
                        }
                        _ => self.skip(key, segment, DropReason::MissingDirection),
                    }
                }
            }
            "field" => {
                let mut fields: Vec<String> = Vec::new();
                for field in value.split(',').map(|f| self.text(f)) {
                    if !field.is_empty() && !fields.contains(&field) {
                        fields.push(field);
                    }
                }
                self.out.query.set_projection(fields);
            }
            other => match DirectiveKind::from_name(other) {
                Some(kind) => {
                    let value = self.text(value);
                    self.out.query.set_directive(kind, value);
                }
                None => self.skip(key, value, DropReason::UnknownDirective(other.to_string())),
            },
        }
    }

    fn condition(&mut self, field: &str, condition: &str) {
        let Some((token, raw)) = condition.split_once(':') else {
            self.skip(field, condition, DropReason::MissingOperator);
            return;
        };
        let token = self.text(token);
        let Some(op) = Op::from_wire(&token) else {
            self.skip(field, condition, DropReason::UnknownOperator(token));
            return;
        };

        let value = if op.is_list() {
            Value::List(raw.split(',').map(|v| Scalar::from(self.text(v))).collect())
        } else if op.is_range() {
            let bounds: Vec<&str> = raw.split(',').collect();
            match bounds.as_slice() {
                [lo, hi] => Value::Pair(Scalar::from(self.text(lo)), Scalar::from(self.text(hi))),
                _ => {
                    self.skip(field, condition, DropReason::BetweenArity(bounds.len()));
                    return;
                }
            }
        } else {
            Value::Scalar(Scalar::from(self.text(raw)))
        };

        match FilterClause::new(field, op, value) {
            Ok(clause) => self.out.query.push_filter(clause),
            Err(err) => {
                tracing::debug!(field = %field, error = %err, "dropping condition");
            }
        }
    }

    fn skip(&mut self, key: &str, fragment: &str, reason: DropReason) {
        tracing::debug!(key = %key, fragment = %fragment, reason = %reason, "dropping fragment");
        self.out.dropped.push(MalformedFragment {
            key: key.to_string(),
            fragment: fragment.to_string(),
            reason,
        });
    }
}
