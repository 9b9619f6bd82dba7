//! Test doubles for the interpreter and console boundaries.
//!
//! Available to this crate's tests and, through the `test-support` feature, to
//! downstream crates that need an engine without a real host interpreter.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use camino::{Utf8Path, Utf8PathBuf};

use crate::console::ConsoleSink;
use crate::frame::{ConstructId, StackFrame};
use crate::interpreter::{Interpreter, RaisedError, TypeCatalog};

/// Identity given to every unit compiled by [`ScriptedInterpreter`].
pub const ROOT: ConstructId = ConstructId(0);

/// Scripted behaviour for one source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Script {
    /// Execution returns the given rendering.
    Returns(String),
    /// Execution raises with the given frames, innermost first. The root
    /// function frame is appended automatically.
    Raises {
        /// Raised error message.
        message: String,
        /// Frames above the root.
        frames: Vec<StackFrame>,
    },
}

/// What the scripted interpreter observed, shared with the test.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    inner: Rc<RefCell<JournalEntries>>,
}

#[derive(Debug, Default)]
struct JournalEntries {
    compiled: Vec<String>,
    executing_paths: Vec<Option<Utf8PathBuf>>,
}

impl Journal {
    /// Source texts handed to `compile`, in order.
    #[must_use]
    pub fn compiled(&self) -> Vec<String> {
        self.inner.borrow().compiled.clone()
    }

    /// Every value published through `set_executing_path`, in order.
    #[must_use]
    pub fn executing_paths(&self) -> Vec<Option<Utf8PathBuf>> {
        self.inner.borrow().executing_paths.clone()
    }
}

/// Interpreter answering from a table of scripted source texts.
///
/// Unknown source texts do not compile.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInterpreter {
    scripts: HashMap<String, Script>,
    journal: Journal,
}

impl ScriptedInterpreter {
    /// Builds an interpreter with no scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts `source` to return `value`.
    #[must_use]
    pub fn returns(mut self, source: &str, value: &str) -> Self {
        self.scripts
            .insert(source.to_owned(), Script::Returns(value.to_owned()));
        self
    }

    /// Scripts `source` to raise `message` with `frames` above the root.
    #[must_use]
    pub fn raises(mut self, source: &str, message: &str, frames: Vec<StackFrame>) -> Self {
        self.scripts.insert(
            source.to_owned(),
            Script::Raises {
                message: message.to_owned(),
                frames,
            },
        );
        self
    }

    /// Handle onto what the interpreter observed.
    #[must_use]
    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }
}

impl TypeCatalog for ScriptedInterpreter {
    fn is_error_type(&self, type_name: &str) -> bool {
        type_name.ends_with("Error")
    }
}

impl Interpreter for ScriptedInterpreter {
    type Unit = Script;
    type Value = String;

    fn compile(&mut self, source: &str) -> Option<Script> {
        self.journal
            .inner
            .borrow_mut()
            .compiled
            .push(source.to_owned());
        self.scripts.get(source).cloned()
    }

    fn construct_of(&self, _unit: &Script) -> ConstructId {
        ROOT
    }

    fn execute(&mut self, unit: Script) -> Result<String, RaisedError> {
        match unit {
            Script::Returns(value) => Ok(value),
            Script::Raises {
                message,
                mut frames,
            } => {
                frames.push(StackFrame::function(ROOT, None));
                Err(RaisedError::new(message, frames))
            }
        }
    }

    fn set_executing_path(&mut self, path: Option<&Utf8Path>) {
        self.journal
            .inner
            .borrow_mut()
            .executing_paths
            .push(path.map(Utf8Path::to_path_buf));
    }
}

/// Console that records every posted line.
#[derive(Debug, Clone, Default)]
pub struct RecordingConsole {
    lines: Rc<RefCell<Vec<String>>>,
}

impl RecordingConsole {
    /// Builds an empty console.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines posted so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

impl ConsoleSink for RecordingConsole {
    fn post(&mut self, line: &str) {
        self.lines.borrow_mut().push(line.to_owned());
    }
}
