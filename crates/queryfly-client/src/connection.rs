//! Running builders against the service.

use queryfly::{compile_insert, Builder, CompiledRequest, Scalar};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::transport::{Method, Payload, Transport};

/// A data service reached through a transport.
///
/// # Example
///
/// ```
/// use queryfly_client::{ClientConfig, Connection, MockTransport};
///
/// let transport = MockTransport::new();
/// transport.respond(r#"{"status": 0, "data": [{"id": 1, "name": "Ada"}]}"#);
///
/// let db = Connection::new(ClientConfig::with_dsn("http://svc/api/shop"), transport).unwrap();
/// let mut users = db.table("users");
/// users.where_("age", ">=", 18).limit(10);
///
/// let rows = db.get(&users).unwrap();
/// assert_eq!(rows[0]["name"], "Ada");
///
/// let call = db.transport().last_call().unwrap();
/// assert_eq!(call.url, "http://svc/api/shop/users/query");
/// assert_eq!(call.target(), "http://svc/api/shop/users/query?age=gte:18&_limit=10");
/// ```
#[derive(Debug)]
pub struct Connection<T> {
    transport: T,
    config: ClientConfig,
    base_url: String,
}

impl<T: Transport> Connection<T> {
    /// Resolves the base URL from `config` and wraps `transport`.
    pub fn new(config: ClientConfig, transport: T) -> Result<Self> {
        let base_url = config.base_url()?;
        Ok(Connection {
            transport,
            config,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Starts a query against a collection.
    pub fn table(&self, collection: impl Into<String>) -> Builder {
        Builder::new(collection)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Runs the builder as a select and returns every row.
    pub fn get(&self, builder: &Builder) -> Result<Vec<Value>> {
        let request = builder.compile()?;
        self.select(&request).map(rows)
    }

    /// Runs a compiled select and returns the decoded result.
    ///
    /// The transport receives the path-only URL; the query string travels in
    /// the payload.
    pub fn select(&self, request: &CompiledRequest) -> Result<Value> {
        let url = format!("{}{}", self.base_url, request.path);
        tracing::debug!(%url, query = %request.query, "select");
        let body = self
            .transport
            .execute(Method::Get, &url, &Payload::Query(request.query.clone()))?;
        decode(&url, &body)
    }

    /// Returns the first row, if any.
    pub fn first(&self, builder: &Builder) -> Result<Option<Value>> {
        let mut single = builder.clone();
        single.take(1);
        Ok(self.get(&single)?.into_iter().next())
    }

    /// Returns the record with the given id, if any.
    pub fn find(&self, builder: &Builder, id: impl Into<Scalar>) -> Result<Option<Value>> {
        let mut by_id = builder.clone();
        by_id.find(id);
        self.first(&by_id)
    }

    /// Returns `true` if the query matches at least one row.
    pub fn exists(&self, builder: &Builder) -> Result<bool> {
        Ok(self.first(builder)?.is_some())
    }

    /// Returns one column from every row. Rows without it give `null`.
    ///
    /// Selects only `column` unless the builder already has a selection.
    pub fn pluck(&self, builder: &Builder, column: &str) -> Result<Vec<Value>> {
        let mut plucking = builder.clone();
        if plucking.get_columns().is_none() {
            plucking.select([column]);
        }
        Ok(self
            .get(&plucking)?
            .iter()
            .map(|row| row.get(column).cloned().unwrap_or(Value::Null))
            .collect())
    }

    // ========================================================================
    // Aggregates
    // ========================================================================

    /// Runs an aggregate and returns the `aggregate` member of the first row.
    ///
    /// The builder's aggregate and column selection are cleared afterwards,
    /// whether or not the call succeeded, so it can run the next query.
    pub fn aggregate(
        &self,
        builder: &mut Builder,
        function: &str,
        columns: &[&str],
    ) -> Result<Option<Value>> {
        builder.aggregate(function, columns.iter().copied());
        let result = self.get(builder);
        builder.clear_aggregate();
        Ok(result?
            .into_iter()
            .next()
            .and_then(|row| row.get("aggregate").cloned()))
    }

    /// Counts matching rows. A missing or non-numeric result counts as zero.
    pub fn count(&self, builder: &mut Builder) -> Result<u64> {
        let value = self.aggregate(builder, "count", &["*"])?;
        Ok(value
            .as_ref()
            .and_then(|v| v.as_u64().or_else(|| v.as_str()?.parse().ok()))
            .unwrap_or(0))
    }

    pub fn max(&self, builder: &mut Builder, column: &str) -> Result<Option<Value>> {
        self.aggregate(builder, "max", &[column])
    }

    pub fn min(&self, builder: &mut Builder, column: &str) -> Result<Option<Value>> {
        self.aggregate(builder, "min", &[column])
    }

    pub fn sum(&self, builder: &mut Builder, column: &str) -> Result<Option<Value>> {
        self.aggregate(builder, "sum", &[column])
    }

    pub fn avg(&self, builder: &mut Builder, column: &str) -> Result<Option<Value>> {
        self.aggregate(builder, "avg", &[column])
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Posts `values` to the collection's insert endpoint.
    pub fn insert(&self, builder: &Builder, values: &Value) -> Result<Value> {
        let request = compile_insert(builder, values);
        let url = format!("{}{}", self.base_url, request.path);
        tracing::debug!(%url, "insert");
        let body = self
            .transport
            .execute(Method::Post, &url, &Payload::Json(values.clone()))?;
        decode(&url, &body)
    }
}

/// Decodes a response body.
///
/// Bodies wrapped in a `{"status", "data", "error_message"}` envelope yield
/// their `data`; a non-zero `status` is a [`ClientError::Service`]. Any other
/// JSON is returned as is.
pub fn decode(url: &str, body: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(body).map_err(|source| ClientError::Decode {
        url: url.to_string(),
        source,
    })?;

    let mut envelope = match value {
        Value::Object(envelope) => envelope,
        other => return Ok(other),
    };

    let status = envelope.get("status").and_then(Value::as_i64).unwrap_or(0);
    if status != 0 {
        let message = match envelope.get("error_message") {
            Some(Value::String(message)) => message.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        return Err(ClientError::Service {
            url: url.to_string(),
            status,
            message,
        });
    }

    match envelope.remove("data") {
        Some(data) => Ok(data),
        None => Ok(Value::Object(envelope)),
    }
}

/// Flattens a decoded result into rows.
pub fn rows(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        single => vec![single],
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decode_unwraps_envelope() {
        let data = decode("u", r#"{"status":0,"data":[1,2],"error_message":""}"#).unwrap();
        assert_eq!(data, json!([1, 2]));
    }

    #[test]
    fn decode_passes_bare_json_through() {
        assert_eq!(decode("u", "[1]").unwrap(), json!([1]));
        assert_eq!(decode("u", r#"{"id":1}"#).unwrap(), json!({"id": 1}));
    }

    #[test]
    fn decode_surfaces_failures() {
        let err = decode("u", "not json").unwrap_err();
        assert!(matches!(err, ClientError::Decode { ref url, .. } if url == "u"));

        let err = decode("u", r#"{"status":10,"data":[],"error_message":"down"}"#).unwrap_err();
        assert_eq!(err.to_string(), "url[u] error[status 10: down]");
    }

    #[test]
    fn rows_shapes() {
        assert_eq!(rows(json!([1, 2])).len(), 2);
        assert!(rows(Value::Null).is_empty());
        assert_eq!(rows(json!({"a": 1})), vec![json!({"a": 1})]);
    }
}
