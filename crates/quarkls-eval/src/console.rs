//! Observation sinks for evaluation side effects.

/// Tracing target used by [`TracingConsole`].
pub const CONSOLE_TARGET: &str = "quarkls::console";

/// Receives console lines produced while evaluating.
pub trait ConsoleSink {
    /// Posts one line of console output.
    fn post(&mut self, line: &str);
}

/// Console that forwards lines to the `tracing` pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingConsole;

impl ConsoleSink for TracingConsole {
    fn post(&mut self, line: &str) {
        tracing::info!(target: CONSOLE_TARGET, "{line}");
    }
}
