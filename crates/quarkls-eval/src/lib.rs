//! Evaluation core for the quarkls language server.
//!
//! The crate runs arbitrary source text through a host [`Interpreter`] and
//! turns the result into an [`EvaluationOutcome`]: a bounded textual result, a
//! compile failure, or a runtime failure with an optional
//! [`BacktraceReport`]. The interpreter itself is external; hosts implement
//! the adapter trait and hand their captured call chain over as plain
//! [`StackFrame`] values, so the engine never reaches into interpreter
//! internals.
//!
//! Console output (result echoes, markers, error reports) is written to a
//! [`ConsoleSink`] and is never part of the returned outcome.

mod backtrace;
mod console;
mod engine;
mod frame;
mod interpreter;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use backtrace::{BacktraceFormatter, BacktraceReport, FrameEntry, FrameHeading, SourceExcerpt};
pub use console::{CONSOLE_TARGET, ConsoleSink, TracingConsole};
pub use engine::{
    AFTER_MARKER, BEFORE_MARKER, COMPILE_ERROR_MESSAGE, EvaluationEngine, EvaluationOutcome,
    Evaluator, Preprocessor, TRUNCATION_MARKER,
};
pub use frame::{Binding, CallChain, ConstructId, FrameOwner, SourceLocation, StackFrame};
pub use interpreter::{FUNCTION_TYPE, Interpreter, RaisedError, TypeCatalog};
