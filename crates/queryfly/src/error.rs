//! Error types for the queryfly crate.

use thiserror::Error;

use crate::op::Op;

/// Errors raised while building, binding or compiling a query.
///
/// Parsing never produces one of these: malformed fragments are dropped.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The clause shape has no representation in the wire grammar.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Requested projection columns are missing from the collection.
    #[error("invalid projection on '{collection}': unknown column(s) {}", .columns.join(", "))]
    InvalidProjection {
        collection: String,
        columns: Vec<String>,
    },

    /// Operator received the wrong number of values.
    #[error("operator '{op}' expects {expected} value(s), got {actual}")]
    InvalidArity {
        op: Op,
        expected: &'static str,
        actual: usize,
    },

    /// Builder state could not be serialized.
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for queryfly operations.
pub type Result<T> = std::result::Result<T, QueryError>;
