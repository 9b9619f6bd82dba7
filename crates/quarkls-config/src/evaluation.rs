//! Settings consumed by the evaluation engine.
//!
//! The values are loaded once at startup and can later be adjusted by the
//! client through `workspace/didChangeConfiguration`. Only the presentation
//! toggles are exposed to the client; size limits stay under operator control.

use serde::{Deserialize, Serialize};

use crate::defaults::{
    DEFAULT_RESULT_PREFIX, DEFAULT_RESULT_STRING_LIMIT, DEFAULT_SOURCE_CODE_LINE_LIMIT,
};

/// Limits and console toggles applied to every evaluation.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct EvaluationSettings {
    /// Maximum number of characters kept from a serialised result.
    pub result_string_limit: usize,
    /// Maximum number of source lines rendered for an anonymous function frame.
    pub source_code_line_limit: usize,
    /// Prefix written before a posted result.
    pub result_prefix: String,
    /// Whether successful results are posted to the console.
    pub post_results: bool,
    /// Whether a marker is posted before evaluation starts.
    pub post_before_marker: bool,
    /// Whether a marker is posted after evaluation finishes.
    pub post_after_marker: bool,
    /// Whether runtime failures carry a filtered backtrace.
    pub improved_error_reports: bool,
    /// Whether leading exception constructor frames are elided from backtraces.
    pub elide_constructor_frames: bool,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            result_string_limit: DEFAULT_RESULT_STRING_LIMIT,
            source_code_line_limit: DEFAULT_SOURCE_CODE_LINE_LIMIT,
            result_prefix: DEFAULT_RESULT_PREFIX.to_owned(),
            post_results: true,
            post_before_marker: false,
            post_after_marker: false,
            improved_error_reports: true,
            elide_constructor_frames: true,
        }
    }
}

impl EvaluationSettings {
    /// Applies a client-supplied settings update, leaving absent keys untouched.
    pub fn apply(&mut self, update: SettingsUpdate) {
        if let Some(prefix) = update.result_prefix {
            self.result_prefix = prefix;
        }
        if let Some(post) = update.post_results {
            self.post_results = post;
        }
        if let Some(improved) = update.improved_error_reports {
            self.improved_error_reports = improved;
        }
    }
}

/// Partial settings sent by the client in `workspace/didChangeConfiguration`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    /// Replacement result prefix.
    #[serde(default)]
    pub result_prefix: Option<String>,
    /// Whether results should be posted.
    #[serde(default)]
    pub post_results: Option<bool>,
    /// Whether enriched error reports are produced.
    #[serde(default)]
    pub improved_error_reports: Option<bool>,
}
