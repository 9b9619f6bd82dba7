//! Adapter boundary between the engine and the host interpreter.

use std::fmt;

use camino::Utf8Path;
use thiserror::Error;

use crate::frame::{CallChain, ConstructId};

/// Name of the host's generic function-invocation type.
pub const FUNCTION_TYPE: &str = "Function";

/// Error raised by the host while executing a compiled unit.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct RaisedError {
    message: String,
    chain: CallChain,
}

impl RaisedError {
    /// Builds an error from its descriptive string and captured call chain.
    #[must_use]
    pub fn new(message: impl Into<String>, chain: impl Into<CallChain>) -> Self {
        Self {
            message: message.into(),
            chain: chain.into(),
        }
    }

    /// Descriptive string of the raised error.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Frames captured at the raise point.
    #[must_use]
    pub fn chain(&self) -> &CallChain {
        &self.chain
    }
}

/// Host knowledge about types that backtrace filtering relies on.
pub trait TypeCatalog {
    /// Whether `type_name` belongs to the host's error/exception hierarchy.
    fn is_error_type(&self, type_name: &str) -> bool;

    /// Whether `owner:method` is a generic control-flow helper whose outer
    /// frames only repeat the ordinary stack.
    fn is_control_flow_helper(&self, owner: &str, method: &str) -> bool {
        owner == FUNCTION_TYPE && matches!(method, "protect" | "try")
    }
}

/// Operations the engine needs from the host interpreter.
pub trait Interpreter: TypeCatalog {
    /// Executable unit produced by a successful compile.
    type Unit;
    /// Value returned by a successful execution.
    type Value: fmt::Display;

    /// Compiles source text. `None` means the text did not compile.
    fn compile(&mut self, source: &str) -> Option<Self::Unit>;

    /// Identity of the compiled unit's outermost function.
    fn construct_of(&self, unit: &Self::Unit) -> ConstructId;

    /// Executes a compiled unit.
    ///
    /// # Errors
    ///
    /// Returns [`RaisedError`] when execution raises.
    fn execute(&mut self, unit: Self::Unit) -> Result<Self::Value, RaisedError>;

    /// Publishes the path of the document being evaluated, or clears it.
    fn set_executing_path(&mut self, path: Option<&Utf8Path>) {
        let _ = path;
    }
}
