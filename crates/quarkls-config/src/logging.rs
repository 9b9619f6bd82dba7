//! Log record formats.
//!
//! Standard output carries the protocol stream, so records always go to
//! stderr. Editors usually show stderr verbatim in an output pane, which is
//! why the compact single-line format is the default. JSON suits log
//! collectors attached to long-running sessions.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How log records are rendered on stderr.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One human-readable line per record, for editor output panes.
    #[default]
    Compact,
    /// One JSON object per record, with event fields flattened.
    Json,
}

/// Error returned when text names no [`LogFormat`].
pub type LogFormatParseError = strum::ParseError;
