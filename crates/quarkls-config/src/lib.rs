//! Shared configuration for the quarkls language server.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then `QUARKLS_*` environment variables, then command-line flags. The
//! resulting [`Config`] is handed to the session at startup; the evaluation
//! settings inside it may later be adjusted by the client.

mod defaults;
mod evaluation;
mod logging;
mod startup;

use std::ffi::OsString;
use std::fs;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_RESULT_PREFIX, DEFAULT_RESULT_STRING_LIMIT,
    DEFAULT_SETTINGS_SECTION, DEFAULT_SOURCE_CODE_LINE_LIMIT, DEFAULT_WORKSPACE_STARTUP_FILE,
    default_log_filter, default_log_filter_string, default_log_format,
};
pub use evaluation::{EvaluationSettings, SettingsUpdate};
pub use logging::{LogFormat, LogFormatParseError};
pub use startup::StartupSettings;

/// Resolved server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// `tracing` filter expression.
    pub log_filter: String,
    /// Output format for log records.
    pub log_format: LogFormat,
    /// Section of client settings consulted on configuration changes.
    pub settings_section: String,
    /// Evaluation limits and console toggles.
    pub evaluation: EvaluationSettings,
    /// Startup file locations.
    pub startup: StartupSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            settings_section: DEFAULT_SETTINGS_SECTION.to_owned(),
            evaluation: EvaluationSettings::default(),
            startup: StartupSettings::default(),
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Command-line or environment arguments were rejected.
    #[error("invalid arguments: {0}")]
    Arguments(#[source] Arc<clap::Error>),
    /// The configuration file could not be read.
    #[error("failed to read configuration file '{path}': {source}")]
    Read {
        /// File that failed to load.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The configuration file is not valid TOML for [`Config`].
    #[error("failed to parse configuration file '{path}': {source}")]
    Parse {
        /// File that failed to parse.
        path: Utf8PathBuf,
        /// Underlying parse failure.
        #[source]
        source: Box<toml::de::Error>,
    },
    /// A value was syntactically valid but unusable.
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// Offending field.
        field: &'static str,
        /// Why the value was rejected.
        message: String,
    },
}

#[derive(Debug, Parser)]
#[command(name = "quarkls", about = "Language server for a live interpreter")]
struct ConfigArgs {
    /// TOML file supplying configuration defaults.
    #[arg(long, env = "QUARKLS_CONFIG_PATH")]
    config_path: Option<Utf8PathBuf>,
    /// `tracing` filter expression.
    #[arg(long, env = "QUARKLS_LOG_FILTER")]
    log_filter: Option<String>,
    /// Log output format (`json` or `compact`).
    #[arg(long, env = "QUARKLS_LOG_FORMAT")]
    log_format: Option<LogFormat>,
    /// Character cap on serialised evaluation results.
    #[arg(long, env = "QUARKLS_RESULT_STRING_LIMIT")]
    result_string_limit: Option<usize>,
    /// Source lines shown per anonymous function frame.
    #[arg(long, env = "QUARKLS_SOURCE_CODE_LINE_LIMIT")]
    source_code_line_limit: Option<usize>,
    /// Global startup file.
    #[arg(long, env = "QUARKLS_GLOBAL_STARTUP_FILE")]
    global_startup_file: Option<Utf8PathBuf>,
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when arguments, the configuration file, or a
    /// resolved value is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_iter(std::env::args_os())
    }

    /// Loads configuration from an explicit argument list.
    ///
    /// The first item is treated as the binary name, as with
    /// [`std::env::args_os`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when arguments, the configuration file, or a
    /// resolved value is invalid.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args = ConfigArgs::try_parse_from(args)
            .map_err(|error| ConfigError::Arguments(Arc::new(error)))?;

        let mut config = match args.config_path.as_deref() {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(filter) = args.log_filter {
            config.log_filter = filter;
        }
        if let Some(format) = args.log_format {
            config.log_format = format;
        }
        if let Some(limit) = args.result_string_limit {
            config.evaluation.result_string_limit = limit;
        }
        if let Some(limit) = args.source_code_line_limit {
            config.evaluation.source_code_line_limit = limit;
        }
        if let Some(path) = args.global_startup_file {
            config.startup.global_startup_file = Some(path);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration file, filling unspecified keys with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`] when the file
    /// cannot be used.
    pub fn from_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.evaluation.result_string_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "result_string_limit",
                message: String::from("must be at least 1"),
            });
        }
        if self.settings_section.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "settings_section",
                message: String::from("must not be empty"),
            });
        }
        Ok(())
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Evaluation settings.
    #[must_use]
    pub fn evaluation(&self) -> &EvaluationSettings {
        &self.evaluation
    }

    /// Startup file settings.
    #[must_use]
    pub fn startup(&self) -> &StartupSettings {
        &self.startup
    }

    /// Section of client settings read on configuration changes.
    #[must_use]
    pub fn settings_section(&self) -> &str {
        self.settings_section.as_str()
    }
}
