//! Configuration snapshot shared by the seedbed bootstrap and its binary.
//!
//! A snapshot is resolved once from the forum's JSON configuration file. The
//! raw document is kept verbatim and the resolver adds the derived keys the
//! rest of the stack reads: the decomposed external URL, the relative mount
//! path, asset and upload base URLs, the effective port, the security flag
//! and the realtime origin pattern. The forum's own `upload_path` and the
//! `test_upload_path` that staging recreates are resolved separately. Store
//! sections are parsed into typed [`StoreTarget`] values for both the
//! production and the test environment.
//!
//! Resolution fails fast: a missing file, a malformed document, or an absent
//! required key is reported before anything else touches the environment.

mod defaults;
mod error;
mod external_url;
mod logging;
mod store;

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Map, Value, json};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_PORT, DEFAULT_TEST_UPLOAD_PATH, DEFAULT_UPLOAD_PATH,
    UPLOAD_DIRECTORIES, default_log_filter,
    default_log_filter_string, default_log_format, upload_directories,
};
pub use error::ConfigError;
pub use external_url::{ExternalUrl, UrlParseError};
pub use logging::{LogFormat, LogFormatParseError, LoggingSection};
pub use store::{StoreEngine, StoreTarget};

/// Resolved, read-only configuration snapshot.
#[derive(Debug, Clone)]
pub struct Config {
    document: Map<String, Value>,
    base_dir: Utf8PathBuf,
    url: ExternalUrl,
    port: u16,
    production_store: StoreTarget,
    test_store: StoreTarget,
    upload_path: Utf8PathBuf,
    test_upload_path: Utf8PathBuf,
    realtime_origins: String,
    test_extensions: Vec<String>,
    logging: LoggingSection,
}

impl Config {
    /// Reads and resolves the JSON file at `path`. Relative paths inside the
    /// document are resolved against the file's directory.
    pub fn load(path: impl AsRef<Utf8Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Missing {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value =
            serde_json::from_str(&text).map_err(|source| ConfigError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;
        let base_dir = match path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent.to_path_buf(),
            _ => Utf8PathBuf::from("."),
        };
        Self::from_value(value, base_dir)
    }

    /// Resolves an in-memory document.
    pub fn from_value(value: Value, base_dir: impl Into<Utf8PathBuf>) -> Result<Self, ConfigError> {
        let Value::Object(mut document) = value else {
            return Err(ConfigError::invalid_key("<root>", "expected a JSON object"));
        };
        let base_dir = base_dir.into();

        let url = match document.get("url") {
            Some(Value::String(raw)) => raw
                .parse::<ExternalUrl>()
                .map_err(|error| ConfigError::invalid_key("url", error.to_string()))?,
            Some(_) => return Err(ConfigError::invalid_key("url", "expected a string")),
            None => return Err(ConfigError::missing_key("url")),
        };

        let port = match (url.port(), document.get("port")) {
            (Some(port), _) => port,
            (None, None | Some(Value::Null)) => DEFAULT_PORT,
            (None, Some(value)) => store::parse_port(value)
                .ok_or_else(|| ConfigError::invalid_key("port", "expected a port number"))?,
        };

        let engine = match lookup(&document, "store.type") {
            Some(Value::String(kind)) => kind
                .parse::<StoreEngine>()
                .map_err(|_| ConfigError::invalid_key("store.type", format!("unsupported engine '{kind}'")))?,
            Some(_) => return Err(ConfigError::invalid_key("store.type", "expected a string")),
            None => return Err(ConfigError::missing_key("store.type")),
        };

        let production_key = format!("store.{engine}");
        let production_store = match lookup(&document, &production_key) {
            Some(section) => StoreTarget::from_section(engine, section, &production_key)?,
            None => return Err(ConfigError::missing_key(production_key)),
        };
        let test_store = match document.get("test_store") {
            Some(section) => StoreTarget::from_section(engine, section, "test_store")?,
            None => return Err(ConfigError::missing_key("test_store")),
        };

        let upload_path = match document.get("upload_path") {
            None | Some(Value::Null) => base_dir.join(DEFAULT_UPLOAD_PATH),
            Some(Value::String(path)) => base_dir.join(path),
            Some(_) => return Err(ConfigError::invalid_key("upload_path", "expected a string")),
        };

        let test_upload_path = match document.get("test_upload_path") {
            None | Some(Value::Null) => base_dir.join(DEFAULT_TEST_UPLOAD_PATH),
            Some(Value::String(path)) if path.trim().is_empty() => {
                return Err(ConfigError::invalid_key(
                    "test_upload_path",
                    "expected a non-empty path",
                ));
            }
            Some(Value::String(path)) => base_dir.join(path),
            Some(_) => {
                return Err(ConfigError::invalid_key("test_upload_path", "expected a string"));
            }
        };

        let realtime_origins = match lookup(&document, "realtime.origins") {
            Some(Value::String(origins)) => origins.clone(),
            Some(_) => {
                return Err(ConfigError::invalid_key("realtime.origins", "expected a string"));
            }
            None => url.origin_pattern(),
        };

        let test_extensions = match document.get("test_extensions") {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => serde_json::from_value::<Vec<String>>(value.clone()).map_err(|_| {
                ConfigError::invalid_key("test_extensions", "expected a list of strings")
            })?,
        };

        let logging = match document.get("logging") {
            None | Some(Value::Null) => LoggingSection::default(),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|error| ConfigError::invalid_key("logging", error.to_string()))?,
        };

        document.insert(
            "url_parsed".into(),
            json!({
                "scheme": url.scheme(),
                "host": url.host(),
                "port": url.port(),
                "path": url.path(),
            }),
        );
        document.insert("relative_path".into(), json!(url.relative_path()));
        document.insert("asset_base_url".into(), json!(url.asset_base_url()));
        document.insert("upload_url".into(), json!(url.upload_url()));
        document.insert("secure".into(), json!(url.secure()));
        document.insert("port".into(), json!(port));
        document.insert("use_port".into(), json!(url.port().is_some()));
        document.insert("realtime_origins".into(), json!(realtime_origins));
        document.insert("upload_path".into(), json!(upload_path.as_str()));
        document.insert("test_upload_path".into(), json!(test_upload_path.as_str()));
        document.insert("base_dir".into(), json!(base_dir.as_str()));

        Ok(Self {
            document,
            base_dir,
            url,
            port,
            production_store,
            test_store,
            upload_path,
            test_upload_path,
            realtime_origins,
            test_extensions,
            logging,
        })
    }

    /// Looks up a raw or derived value by dotted key path.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        lookup(&self.document, key)
    }

    /// Directory that relative paths are resolved against.
    #[must_use]
    pub fn base_dir(&self) -> &Utf8Path {
        self.base_dir.as_path()
    }

    /// Decomposed external URL.
    #[must_use]
    pub fn url(&self) -> &ExternalUrl {
        &self.url
    }

    /// Port the web listener binds.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Target named by `store.<type>`.
    #[must_use]
    pub fn production_store(&self) -> &StoreTarget {
        &self.production_store
    }

    /// Target named by `test_store`; the only one the bootstrap connects to.
    #[must_use]
    pub fn test_store(&self) -> &StoreTarget {
        &self.test_store
    }

    /// Root directory of the forum's own uploads. Never staged.
    #[must_use]
    pub fn upload_path(&self) -> &Utf8Path {
        self.upload_path.as_path()
    }

    /// Test-only upload root that staging removes and recreates.
    #[must_use]
    pub fn test_upload_path(&self) -> &Utf8Path {
        self.test_upload_path.as_path()
    }

    /// Origin pattern accepted by the realtime transport.
    #[must_use]
    pub fn realtime_origins(&self) -> &str {
        self.realtime_origins.as_str()
    }

    /// Extensions activated in addition to the baseline set.
    #[must_use]
    pub fn test_extensions(&self) -> &[String] {
        self.test_extensions.as_slice()
    }

    /// Configured log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.logging.filter.as_str()
    }

    /// Configured log format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.logging.format
    }
}

fn lookup<'a>(document: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    let mut segments = key.split('.');
    let first = segments.next()?;
    segments.try_fold(document.get(first)?, |value, segment| {
        value.as_object()?.get(segment)
    })
}
