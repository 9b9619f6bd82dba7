//! Compile, execute, and report on arbitrary source text.

mod limit;

use std::borrow::Cow;

use camino::Utf8Path;
use quarkls_config::EvaluationSettings;
use serde::Serialize;
use tracing::debug;

use crate::backtrace::{BacktraceFormatter, BacktraceReport};
use crate::console::{ConsoleSink, TracingConsole};
use crate::interpreter::Interpreter;

use self::limit::render_limited;

const ENGINE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::engine");

/// Message reported when source text yields no executable unit.
pub const COMPILE_ERROR_MESSAGE: &str = "Compile error?";
/// Suffix appended to results cut at the configured limit.
pub const TRUNCATION_MARKER: &str = "...etc...";
/// Console line posted before execution when enabled.
pub const BEFORE_MARKER: &str = "**** evaluation started ****";
/// Console line posted after execution when enabled.
pub const AFTER_MARKER: &str = "**** evaluation finished ****";

/// Hook that rewrites source text before it is compiled.
pub type Preprocessor = dyn Fn(&str) -> String;

/// Result of one evaluation.
///
/// Serialises to exactly one of `{"result"}`, `{"compileError"}` or
/// `{"error", "backtrace"?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EvaluationOutcome {
    /// Execution returned a value.
    Success {
        /// Rendered value, possibly truncated.
        result: String,
    },
    /// The text did not compile.
    CompileError {
        /// Always [`COMPILE_ERROR_MESSAGE`].
        #[serde(rename = "compileError")]
        message: String,
    },
    /// Execution raised.
    EvaluationError {
        /// Descriptive string of the raised error.
        #[serde(rename = "error")]
        message: String,
        /// Filtered call chain, present when enriched reports are enabled.
        #[serde(skip_serializing_if = "Option::is_none")]
        backtrace: Option<BacktraceReport>,
    },
}

impl EvaluationOutcome {
    /// Returns `true` for [`EvaluationOutcome::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Object-safe view of an engine, used by callers that do not care about the
/// concrete interpreter.
pub trait Evaluator {
    /// Evaluates `source` while `path` is published as the executing document.
    fn evaluate_in(&mut self, path: Option<&Utf8Path>, source: &str) -> EvaluationOutcome;

    /// Evaluates `source` with no executing document.
    fn evaluate(&mut self, source: &str) -> EvaluationOutcome {
        self.evaluate_in(None, source)
    }

    /// Settings currently in force.
    fn settings(&self) -> &EvaluationSettings;

    /// Replaces the settings used by later evaluations.
    fn set_settings(&mut self, settings: EvaluationSettings);
}

/// Runs source text through a host [`Interpreter`].
pub struct EvaluationEngine<I: Interpreter> {
    interpreter: I,
    settings: EvaluationSettings,
    preprocessor: Option<Box<Preprocessor>>,
    console: Box<dyn ConsoleSink>,
}

impl<I: Interpreter> EvaluationEngine<I> {
    /// Builds an engine that posts console lines through `tracing`.
    #[must_use]
    pub fn new(interpreter: I, settings: EvaluationSettings) -> Self {
        Self {
            interpreter,
            settings,
            preprocessor: None,
            console: Box::new(TracingConsole),
        }
    }

    /// Replaces the console sink.
    #[must_use]
    pub fn with_console(mut self, console: impl ConsoleSink + 'static) -> Self {
        self.console = Box::new(console);
        self
    }

    /// Installs a hook applied to source text before compiling.
    #[must_use]
    pub fn with_preprocessor(mut self, hook: impl Fn(&str) -> String + 'static) -> Self {
        self.preprocessor = Some(Box::new(hook));
        self
    }

    /// Host interpreter.
    #[must_use]
    pub fn interpreter(&self) -> &I {
        &self.interpreter
    }

    /// Mutable access to the host interpreter.
    pub fn interpreter_mut(&mut self) -> &mut I {
        &mut self.interpreter
    }

    fn run(&mut self, source: &str) -> EvaluationOutcome {
        let text = match &self.preprocessor {
            Some(hook) => Cow::Owned(hook(source)),
            None => Cow::Borrowed(source),
        };

        let Some(unit) = self.interpreter.compile(&text) else {
            debug!(target: ENGINE_TARGET, "source did not compile");
            return EvaluationOutcome::CompileError {
                message: COMPILE_ERROR_MESSAGE.to_owned(),
            };
        };
        let root = self.interpreter.construct_of(&unit);

        if self.settings.post_before_marker {
            self.console.post(BEFORE_MARKER);
        }

        let outcome = match self.interpreter.execute(unit) {
            Ok(value) => {
                let result = render_limited(&value, self.settings.result_string_limit);
                if self.settings.post_results {
                    let line = format!("{}{result}", self.settings.result_prefix);
                    self.console.post(&line);
                }
                EvaluationOutcome::Success { result }
            }
            Err(error) => {
                debug!(target: ENGINE_TARGET, error = error.message(), "evaluation raised");
                let backtrace = self.settings.improved_error_reports.then(|| {
                    BacktraceFormatter::new(&self.settings).format(
                        error.chain(),
                        root,
                        &self.interpreter,
                    )
                });
                self.console.post(&format!("ERROR: {}", error.message()));
                if let Some(report) = &backtrace {
                    for line in report.to_string().lines() {
                        self.console.post(line);
                    }
                }
                EvaluationOutcome::EvaluationError {
                    message: error.message().to_owned(),
                    backtrace,
                }
            }
        };

        if self.settings.post_after_marker {
            self.console.post(AFTER_MARKER);
        }
        outcome
    }
}

impl<I: Interpreter> Evaluator for EvaluationEngine<I> {
    fn evaluate_in(&mut self, path: Option<&Utf8Path>, source: &str) -> EvaluationOutcome {
        self.interpreter.set_executing_path(path);
        let outcome = self.run(source);
        self.interpreter.set_executing_path(None);
        outcome
    }

    fn settings(&self) -> &EvaluationSettings {
        &self.settings
    }

    fn set_settings(&mut self, settings: EvaluationSettings) {
        self.settings = settings;
    }
}

#[cfg(test)]
mod tests;
