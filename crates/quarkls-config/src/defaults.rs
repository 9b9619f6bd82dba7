//! Built-in defaults shared by the configuration layers.

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default cap, in characters, on a serialised evaluation result.
pub const DEFAULT_RESULT_STRING_LIMIT: usize = 2000;

/// Default number of function source lines shown per backtrace frame.
pub const DEFAULT_SOURCE_CODE_LINE_LIMIT: usize = 6;

/// Default prefix prepended to posted evaluation results.
pub const DEFAULT_RESULT_PREFIX: &str = "-> ";

/// Default workspace-relative name of the per-workspace startup file.
pub const DEFAULT_WORKSPACE_STARTUP_FILE: &str = "startup.scd";

/// Default section of `workspace/didChangeConfiguration` settings read by the server.
pub const DEFAULT_SETTINGS_SECTION: &str = "quarkls";

/// Default log filter expression used by the server.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::default()
}
