//! Structured logging for the language server.
//!
//! Standard output carries the protocol, so every record goes to stderr.
//! Evaluation console lines are logged under [`CONSOLE_TARGET`] and stay
//! visible at `info` unless the configured filter names that target itself.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use quarkls_config::{Config, LogFormat};
use quarkls_eval::CONSOLE_TARGET;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt;

static TELEMETRY_GUARD: OnceCell<LogFormat> = OnceCell::new();

/// Handle returned once telemetry is installed.
#[derive(Debug, Clone, Copy)]
pub struct TelemetryHandle {
    format: LogFormat,
}

impl TelemetryHandle {
    /// Format chosen by the call that installed the subscriber.
    #[must_use]
    pub fn format(self) -> LogFormat {
        self.format
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter expression did not parse.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Another global subscriber was already installed.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global subscriber on first use.
///
/// Later calls return a handle for the subscriber already installed and
/// ignore `config`.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or a foreign
/// subscriber is already installed.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    let format = TELEMETRY_GUARD.get_or_try_init(|| {
        install_subscriber(config)?;
        Ok::<_, TelemetryError>(config.log_format())
    })?;
    Ok(TelemetryHandle { format: *format })
}

fn session_filter(expression: &str) -> Result<EnvFilter, TelemetryError> {
    let filter =
        EnvFilter::try_new(expression).map_err(|error| TelemetryError::Filter(error.to_string()))?;
    if expression.contains(CONSOLE_TARGET) {
        return Ok(filter);
    }
    let console: Directive = format!("{CONSOLE_TARGET}=info")
        .parse()
        .map_err(|error: tracing_subscriber::filter::ParseError| {
            TelemetryError::Filter(error.to_string())
        })?;
    Ok(filter.add_directive(console))
}

fn install_subscriber(config: &Config) -> Result<(), TelemetryError> {
    let filter = session_filter(config.log_filter())?;

    let builder = |filter: EnvFilter| {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
            .with_timer(fmt::time::UtcTime::rfc_3339())
    };

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Compact => Box::new(builder(filter).compact().finish()),
        LogFormat::Json => Box::new(builder(filter).json().flatten_event(true).finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn rejects_malformed_filters() {
        assert!(matches!(
            session_filter("quarkls=notalevel["),
            Err(TelemetryError::Filter(_))
        ));
    }

    #[rstest]
    fn console_lines_survive_a_quiet_filter() {
        let filter = session_filter("warn").expect("filter parses");
        assert!(filter.to_string().contains("quarkls::console=info"));
    }

    #[rstest]
    fn explicit_console_directive_is_respected() {
        let filter = session_filter("warn,quarkls::console=off").expect("filter parses");
        let rendered = filter.to_string();
        assert!(rendered.contains("quarkls::console=off"));
        assert!(!rendered.contains("quarkls::console=info"));
    }
}
