use camino::Utf8PathBuf;

use crate::logging::LogFormat;

/// Port used when neither the external URL nor the `port` key names one.
pub const DEFAULT_PORT: u16 = 4567;

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Upload root used when the configuration omits `upload_path`.
pub const DEFAULT_UPLOAD_PATH: &str = "public/uploads";

/// Test-only upload root used when the configuration omits `test_upload_path`.
pub const DEFAULT_TEST_UPLOAD_PATH: &str = "test/uploads";

/// Directories recreated under the test upload root before every suite.
pub const UPLOAD_DIRECTORIES: &[&str] = &["profile", "files", "system", "category"];

/// Default log filter expression used by the binary.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Default logging format for the binary.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Upload directory set as relative paths.
pub fn upload_directories() -> Vec<Utf8PathBuf> {
    UPLOAD_DIRECTORIES.iter().map(Utf8PathBuf::from).collect()
}
