//! Configuration loaders backed by temporary directories.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Value, json};
use tempfile::TempDir;

use seedbed_config::{Config, ConfigError};

use crate::bootstrap::ConfigLoader;

/// Loader that resolves an in-memory document against a temporary directory.
pub struct TestConfigLoader {
    dir: TempDir,
    document: Value,
}

impl TestConfigLoader {
    /// Memory engine with distinct production and test databases.
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temporary directory");
        let document = json!({
            "url": "http://127.0.0.1/forum",
            "port": 0,
            "store": {
                "type": "memory",
                "memory": { "host": "127.0.0.1", "database": "forum" }
            },
            "test_store": { "host": "127.0.0.1", "database": "forum_test" },
            "test_extensions": ["nodebb-plugin-markdown"]
        });
        Self { dir, document }
    }

    /// Points the test store at the production database.
    #[must_use]
    pub fn with_identical_targets(mut self) -> Self {
        self.document["test_store"]["database"] = json!("forum");
        self
    }

    /// Replaces one top-level key of the document.
    #[must_use]
    pub fn with_key(mut self, key: &str, value: Value) -> Self {
        self.document[key] = value;
        self
    }

    /// Directory relative paths are resolved against.
    #[must_use]
    pub fn root(&self) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.dir.path().to_path_buf())
            .expect("temporary directory path was not valid UTF-8")
    }

    /// Test upload root the configuration resolves to.
    #[must_use]
    pub fn upload_root(&self) -> Utf8PathBuf {
        self.root().join("test/uploads")
    }

    /// Forum upload directory the configuration resolves to.
    #[must_use]
    pub fn production_upload_root(&self) -> Utf8PathBuf {
        self.root().join("public/uploads")
    }

    /// Resolved snapshot.
    #[must_use]
    pub fn config(&self) -> Config {
        self.load().expect("test configuration should resolve")
    }

    /// Writes the document to `config.json` and returns its path.
    #[must_use]
    pub fn write_file(&self) -> Utf8PathBuf {
        let path = self.root().join("config.json");
        let text = serde_json::to_string_pretty(&self.document).expect("document should serialise");
        fs::write(&path, text).expect("config file should be written");
        path
    }

    /// Creates `relative` under the upload root with some content.
    pub fn plant_upload(&self, relative: impl AsRef<Utf8Path>) {
        let path = self.upload_root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("upload parent should be created");
        }
        fs::write(&path, b"stale").expect("stale upload should be written");
    }

    /// Creates `relative` under the forum upload directory.
    pub fn plant_production_upload(&self, relative: impl AsRef<Utf8Path>) -> Utf8PathBuf {
        let path = self.production_upload_root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("upload parent should be created");
        }
        fs::write(&path, b"production").expect("production upload should be written");
        path
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Config::from_value(self.document.clone(), self.root())
    }
}

/// Loader pointing at a file that does not exist.
pub struct MissingConfigLoader {
    dir: TempDir,
}

impl MissingConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temporary directory"),
        }
    }
}

impl ConfigLoader for MissingConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        let path = self.dir.path().join("absent.json");
        let path = Utf8PathBuf::from_path_buf(path)
            .expect("temporary directory path was not valid UTF-8");
        Config::load(path)
    }
}
