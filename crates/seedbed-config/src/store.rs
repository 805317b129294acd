//! Data-store connection identities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use crate::error::ConfigError;

const DEFAULT_HOST: &str = "127.0.0.1";

/// Storage engines the forum can run against.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StoreEngine {
    /// Redis key/value server.
    Redis,
    /// MongoDB document store.
    Mongo,
    /// PostgreSQL.
    Postgres,
    /// In-process engine, used by tests and local smoke runs.
    Memory,
}

impl StoreEngine {
    /// Port assumed when a store section omits one.
    #[must_use]
    pub fn default_port(self) -> u16 {
        match self {
            Self::Redis => 6379,
            Self::Mongo => 27017,
            Self::Postgres => 5432,
            Self::Memory => 0,
        }
    }
}

/// Identity of a single data-store connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreTarget {
    engine: StoreEngine,
    host: String,
    port: u16,
    database: String,
    options: Map<String, Value>,
}

impl StoreTarget {
    /// Builds a target without driver options.
    #[must_use]
    pub fn new(
        engine: StoreEngine,
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            host: host.into(),
            port,
            database: database.into(),
            options: Map::new(),
        }
    }

    /// Reads a target from a configuration object such as `store.redis` or
    /// `test_store`. `key` is the dotted path used in error messages.
    pub fn from_section(engine: StoreEngine, section: &Value, key: &str) -> Result<Self, ConfigError> {
        let Some(object) = section.as_object() else {
            return Err(ConfigError::invalid_key(key, "expected an object"));
        };

        let host = match object.get("host") {
            None | Some(Value::Null) => DEFAULT_HOST.to_string(),
            Some(Value::String(host)) if !host.trim().is_empty() => host.trim().to_string(),
            Some(_) => {
                return Err(ConfigError::invalid_key(
                    format!("{key}.host"),
                    "expected a non-empty string",
                ));
            }
        };

        let port = match object.get("port") {
            None | Some(Value::Null) => engine.default_port(),
            Some(value) => parse_port(value).ok_or_else(|| {
                ConfigError::invalid_key(format!("{key}.port"), "expected a port number")
            })?,
        };

        let database = match object.get("database") {
            Some(Value::String(name)) if !name.trim().is_empty() => name.trim().to_string(),
            Some(Value::Number(index)) => index.to_string(),
            Some(Value::Null) | None => {
                return Err(ConfigError::missing_key(format!("{key}.database")));
            }
            Some(_) => {
                return Err(ConfigError::invalid_key(
                    format!("{key}.database"),
                    "expected a database name or index",
                ));
            }
        };

        let options = object
            .iter()
            .filter(|(name, _)| !matches!(name.as_str(), "host" | "port" | "database"))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Ok(Self {
            engine,
            host,
            port,
            database,
            options,
        })
    }

    /// Engine serving this target.
    #[must_use]
    pub fn engine(&self) -> StoreEngine {
        self.engine
    }

    /// Host name.
    #[must_use]
    pub fn host(&self) -> &str {
        self.host.as_str()
    }

    /// TCP port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Logical database name or index.
    #[must_use]
    pub fn database(&self) -> &str {
        self.database.as_str()
    }

    /// Driver options carried verbatim (credentials, pool sizes, ...).
    #[must_use]
    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    /// Two targets address the same environment when host, port and database
    /// all match. The engine is not part of the identity.
    #[must_use]
    pub fn same_environment(&self, other: &Self) -> bool {
        self.host == other.host && self.port == other.port && self.database == other.database
    }
}

impl fmt::Display for StoreTarget {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}://{}:{}/{}",
            self.engine, self.host, self.port, self.database
        )
    }
}

pub(crate) fn parse_port(value: &Value) -> Option<u16> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|port| u16::try_from(port).ok()),
        Value::String(text) => u16::from_str(text.trim()).ok(),
        _ => None,
    }
}
