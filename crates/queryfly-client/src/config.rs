//! Connection configuration.
//!
//! ```yaml
//! protocol: https
//! host: [db1.internal, db2.internal]
//! port: 8080
//! database: shop
//! ```
//!
//! resolves to `https://db1.internal:8080/api/shop`. A `dsn` overrides
//! everything else.

use std::path::Path;

use queryfly::OneOrMany;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_PREFIX: &str = "/api";

/// Where the data service lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Complete base URL. Takes precedence over the other fields.
    pub dsn: Option<String>,
    pub protocol: String,
    /// One host or a list; the first is used.
    #[serde(alias = "host")]
    pub hosts: Option<OneOrMany>,
    /// Appended to hosts that carry no port of their own.
    pub port: Option<u16>,
    pub database: String,
    /// Path between host and database. Empty means `/api`.
    pub prefix: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            dsn: None,
            protocol: "http".to_string(),
            hosts: None,
            port: None,
            database: String::new(),
            prefix: None,
        }
    }
}

impl ClientConfig {
    /// A config that uses `dsn` verbatim.
    pub fn with_dsn(dsn: impl Into<String>) -> Self {
        ClientConfig {
            dsn: Some(dsn.into()),
            ..ClientConfig::default()
        }
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Loads a `.yaml`, `.yml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&raw),
            Some("json") => Self::from_json_str(&raw),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    /// The prefix in effect.
    pub fn prefix(&self) -> &str {
        match self.prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => prefix,
            _ => DEFAULT_PREFIX,
        }
    }

    /// Resolves the base URL requests are sent to.
    ///
    /// Returns the DSN when set; otherwise
    /// `{protocol}://{host}{prefix}/{database}` with the first host.
    pub fn base_url(&self) -> Result<String, ConfigError> {
        if let Some(dsn) = self.dsn.as_deref().filter(|d| !d.is_empty()) {
            return Ok(dsn.to_string());
        }

        let host = self
            .hosts
            .as_ref()
            .and_then(OneOrMany::first)
            .filter(|h| !h.is_empty())
            .ok_or(ConfigError::NoHost)?;
        let host = match self.port {
            Some(port) if !host.contains(':') => format!("{host}:{port}"),
            _ => host.to_string(),
        };

        Ok(format!(
            "{}://{}{}/{}",
            self.protocol,
            host,
            self.prefix(),
            self.database
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dsn_wins() {
        let mut config = ClientConfig::with_dsn("http://x/y");
        config.hosts = Some("ignored".into());
        assert_eq!(config.base_url().unwrap(), "http://x/y");
    }

    #[test]
    fn assembled_from_parts() {
        let config = ClientConfig {
            hosts: Some("db.local".into()),
            database: "shop".into(),
            ..ClientConfig::default()
        };
        assert_eq!(config.base_url().unwrap(), "http://db.local/api/shop");
    }

    #[test]
    fn empty_prefix_falls_back() {
        let config = ClientConfig {
            hosts: Some("db".into()),
            database: "d".into(),
            prefix: Some(String::new()),
            ..ClientConfig::default()
        };
        assert_eq!(config.prefix(), "/api");

        let custom = ClientConfig {
            prefix: Some("/v2".into()),
            ..config
        };
        assert_eq!(custom.base_url().unwrap(), "http://db/v2/d");
    }

    #[test]
    fn port_added_only_when_missing() {
        let config = ClientConfig {
            hosts: Some(vec!["a:1", "b"].into()),
            port: Some(9),
            database: "d".into(),
            ..ClientConfig::default()
        };
        assert_eq!(config.base_url().unwrap(), "http://a:1/api/d");

        let config = ClientConfig {
            hosts: Some("b".into()),
            ..config
        };
        assert_eq!(config.base_url().unwrap(), "http://b:9/api/d");
    }

    #[test]
    fn no_host_is_an_error() {
        let err = ClientConfig::default().base_url().unwrap_err();
        assert!(matches!(err, ConfigError::NoHost));
    }

    #[test]
    fn yaml_accepts_host_alias_and_lists() {
        let config = ClientConfig::from_yaml_str(
            "protocol: https\nhost:\n  - one\n  - two\ndatabase: shop\n",
        )
        .unwrap();
        assert_eq!(config.base_url().unwrap(), "https://one/api/shop");

        let config = ClientConfig::from_yaml_str("host: solo\ndatabase: x\n").unwrap();
        assert_eq!(config.base_url().unwrap(), "http://solo/api/x");
    }

    #[test]
    fn json_config() {
        let config =
            ClientConfig::from_json_str(r#"{"dsn": "http://svc/api/db"}"#).unwrap();
        assert_eq!(config.base_url().unwrap(), "http://svc/api/db");
    }

    #[test]
    fn load_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("db.yml");
        std::fs::write(&yaml, "host: h\ndatabase: d\n").unwrap();
        assert_eq!(
            ClientConfig::load(&yaml).unwrap().base_url().unwrap(),
            "http://h/api/d"
        );

        let toml = dir.path().join("db.toml");
        std::fs::write(&toml, "").unwrap();
        assert!(matches!(
            ClientConfig::load(&toml),
            Err(ConfigError::UnsupportedFormat(ext)) if ext == "toml"
        ));

        assert!(matches!(
            ClientConfig::load(dir.path().join("missing.yaml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
