//! Call-frame model captured by the host when execution raises.

use std::fmt;

use camino::Utf8PathBuf;
use serde::Serialize;

/// Identity of a compiled construct (a function body) inside the host.
///
/// The engine only compares identities; the numbering scheme belongs to the
/// host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ConstructId(pub u64);

impl fmt::Display for ConstructId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "#{}", self.0)
    }
}

/// Source position where a method is defined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    /// File holding the definition.
    pub path: Utf8PathBuf,
    /// Zero-based line of the definition.
    pub line: u32,
}

impl SourceLocation {
    /// Builds a location.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>, line: u32) -> Self {
        Self {
            path: path.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.path, self.line + 1)
    }
}

/// A `name = value` pair shown for arguments and locals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    /// Variable name.
    pub name: String,
    /// Default textual representation of the bound value.
    pub value: String,
}

impl Binding {
    /// Builds a binding.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} = {}", self.name, self.value)
    }
}

/// Construct that owns a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOwner {
    /// A named method on a type.
    Method {
        /// Type that defines the method.
        owner: String,
        /// Method selector.
        name: String,
        /// Where the method is defined, when known.
        location: Option<SourceLocation>,
    },
    /// An anonymous function.
    Function {
        /// Identity of the function's compiled body.
        construct: ConstructId,
        /// Original source text, when the host retained it.
        source: Option<String>,
    },
}

/// One level of a captured call chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Owning construct.
    pub owner: FrameOwner,
    /// Argument bindings in declaration order.
    pub arguments: Vec<Binding>,
    /// Local variable bindings in declaration order.
    pub locals: Vec<Binding>,
}

impl StackFrame {
    /// Builds a frame for a method without bindings.
    #[must_use]
    pub fn method(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self::owned_by(FrameOwner::Method {
            owner: owner.into(),
            name: name.into(),
            location: None,
        })
    }

    /// Builds a frame for an anonymous function without bindings.
    #[must_use]
    pub fn function(construct: ConstructId, source: Option<String>) -> Self {
        Self::owned_by(FrameOwner::Function { construct, source })
    }

    fn owned_by(owner: FrameOwner) -> Self {
        Self {
            owner,
            arguments: Vec::new(),
            locals: Vec::new(),
        }
    }

    /// Attaches a defining location to a method frame. Function frames are
    /// returned unchanged.
    #[must_use]
    pub fn at(mut self, location: SourceLocation) -> Self {
        if let FrameOwner::Method { location: slot, .. } = &mut self.owner {
            *slot = Some(location);
        }
        self
    }

    /// Appends an argument binding.
    #[must_use]
    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.push(Binding::new(name, value));
        self
    }

    /// Appends a local binding.
    #[must_use]
    pub fn with_local(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.locals.push(Binding::new(name, value));
        self
    }

    /// Identity of the owning function, if the frame belongs to one.
    #[must_use]
    pub fn construct(&self) -> Option<ConstructId> {
        match &self.owner {
            FrameOwner::Function { construct, .. } => Some(*construct),
            FrameOwner::Method { .. } => None,
        }
    }

    /// Owner type and selector when the frame belongs to a method.
    #[must_use]
    pub fn method_name(&self) -> Option<(&str, &str)> {
        match &self.owner {
            FrameOwner::Method { owner, name, .. } => Some((owner.as_str(), name.as_str())),
            FrameOwner::Function { .. } => None,
        }
    }
}

/// Call chain captured when execution raised, innermost frame first.
///
/// The caller of the frame at index `i` is the frame at `i + 1`. The chain is
/// borrowed while a report is produced and never retained by it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallChain {
    frames: Vec<StackFrame>,
}

impl CallChain {
    /// Wraps frames ordered innermost first.
    #[must_use]
    pub fn new(frames: Vec<StackFrame>) -> Self {
        Self { frames }
    }

    /// Frames ordered innermost first.
    #[must_use]
    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }

    /// Caller of the frame at `index`.
    #[must_use]
    pub fn caller_of(&self, index: usize) -> Option<&StackFrame> {
        index.checked_add(1).and_then(|next| self.frames.get(next))
    }

    /// Number of captured frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` when nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl From<Vec<StackFrame>> for CallChain {
    fn from(frames: Vec<StackFrame>) -> Self {
        Self::new(frames)
    }
}
