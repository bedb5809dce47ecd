//! Queryfly client - run [`queryfly::Builder`] queries against a REST data
//! service.
//!
//! The crate is transport-agnostic: implement [`Transport`] over any HTTP
//! client and hand it to a [`Connection`]. Responses are decoded strictly: a
//! transport failure, a body that is not JSON, or an envelope with a failure
//! status is an error, never an empty result.
//!
//! ```rust
//! use queryfly_client::{ClientConfig, Connection, MockTransport};
//!
//! let config = ClientConfig::from_yaml_str("host: db.local\ndatabase: shop\n").unwrap();
//! let transport = MockTransport::new();
//! transport.respond(r#"{"status": 0, "data": [{"aggregate": 42}]}"#);
//!
//! let db = Connection::new(config, transport).unwrap();
//! let mut orders = db.table("orders");
//! orders.where_("state", "=", "open");
//!
//! assert_eq!(db.count(&mut orders).unwrap(), 42);
//! assert_eq!(
//!     db.transport().last_call().unwrap().target(),
//!     "http://db.local/api/shop/orders/query?_aggregate=count&state=eq:open"
//! );
//! ```

mod config;
mod connection;
mod error;
mod transport;

pub use config::ClientConfig;
pub use connection::{decode, rows, Connection};
pub use error::{ClientError, ConfigError, Result};
pub use transport::{Method, MockTransport, Payload, RecordedCall, Transport, TransportError};
