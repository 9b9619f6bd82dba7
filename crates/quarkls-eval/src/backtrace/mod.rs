//! Filtered, human-readable reports for runtime failures.
//!
//! The formatter walks the call chain captured by the host from the raise
//! point outward. Leading exception constructor frames are elided, frames are
//! rendered until the evaluation's own root function is reached, and anything
//! outside the innermost `protect`/`try` helper is dropped because it merely
//! repeats the ordinary stack.

mod source;

use std::fmt;

use quarkls_config::EvaluationSettings;
use serde::Serialize;

use crate::frame::{Binding, CallChain, ConstructId, FrameOwner, SourceLocation, StackFrame};
use crate::interpreter::TypeCatalog;

pub use self::source::SourceExcerpt;

/// Heading line of a rendered frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FrameHeading {
    /// A named method.
    Method {
        /// Type defining the method.
        owner: String,
        /// Method selector.
        name: String,
        /// Defining source location, when known.
        #[serde(skip_serializing_if = "Option::is_none")]
        location: Option<SourceLocation>,
    },
    /// An anonymous function.
    Function {
        /// Opaque function identity.
        construct: ConstructId,
        /// Leading source lines, when the host kept the source.
        #[serde(skip_serializing_if = "Option::is_none")]
        excerpt: Option<SourceExcerpt>,
    },
}

/// One rendered frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameEntry {
    /// What the frame belongs to.
    pub heading: FrameHeading,
    /// Arguments followed by locals.
    pub bindings: Vec<Binding>,
}

/// Result of formatting a captured call chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktraceReport {
    entries: Vec<FrameEntry>,
    skipped_frames: usize,
}

impl BacktraceReport {
    /// Rendered frames, innermost first.
    #[must_use]
    pub fn entries(&self) -> &[FrameEntry] {
        &self.entries
    }

    /// Number of leading constructor frames that were elided.
    #[must_use]
    pub fn skipped_frames(&self) -> usize {
        self.skipped_frames
    }

    /// Returns `true` when no frame was rendered and none was skipped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.skipped_frames == 0
    }
}

impl fmt::Display for BacktraceReport {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.skipped_frames {
            0 => {}
            1 => writeln!(formatter, "(1 constructor frame skipped)")?,
            count => writeln!(formatter, "({count} constructor frames skipped)")?,
        }
        for entry in &self.entries {
            write_entry(formatter, entry)?;
        }
        Ok(())
    }
}

fn write_entry(formatter: &mut fmt::Formatter<'_>, entry: &FrameEntry) -> fmt::Result {
    match &entry.heading {
        FrameHeading::Method {
            owner,
            name,
            location: Some(location),
        } => writeln!(formatter, "{owner}:{name}  ({location})")?,
        FrameHeading::Method {
            owner,
            name,
            location: None,
        } => writeln!(formatter, "{owner}:{name}")?,
        FrameHeading::Function { construct, excerpt } => {
            writeln!(formatter, "a Function{construct}")?;
            if let Some(excerpt) = excerpt {
                for line in excerpt.to_string().lines() {
                    writeln!(formatter, "    {line}")?;
                }
            }
        }
    }
    for binding in &entry.bindings {
        writeln!(formatter, "    {binding}")?;
    }
    Ok(())
}

/// Produces [`BacktraceReport`]s from captured call chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BacktraceFormatter {
    source_code_line_limit: usize,
    elide_constructor_frames: bool,
}

impl BacktraceFormatter {
    /// Builds a formatter from the evaluation settings.
    #[must_use]
    pub fn new(settings: &EvaluationSettings) -> Self {
        Self {
            source_code_line_limit: settings.source_code_line_limit,
            elide_constructor_frames: settings.elide_constructor_frames,
        }
    }

    /// Formats `chain`, stopping at the frame owned by `root`.
    #[must_use]
    pub fn format(
        &self,
        chain: &CallChain,
        root: ConstructId,
        catalog: &dyn TypeCatalog,
    ) -> BacktraceReport {
        let frames = chain.frames();

        let mut start = 0;
        if self.elide_constructor_frames {
            while let Some(frame) = frames.get(start) {
                if !is_skippable(frame, catalog) || chain.caller_of(start).is_none() {
                    break;
                }
                start += 1;
            }
        }

        let mut entries = Vec::new();
        let mut cut = None;
        for frame in frames.iter().skip(start) {
            if frame.construct() == Some(root) {
                break;
            }
            if cut.is_none() && is_control_flow_helper(frame, catalog) {
                cut = Some(entries.len());
            }
            entries.push(self.render(frame));
        }
        if let Some(position) = cut {
            entries.truncate(position);
        }

        BacktraceReport {
            entries,
            skipped_frames: start,
        }
    }

    fn render(&self, frame: &StackFrame) -> FrameEntry {
        let heading = match &frame.owner {
            FrameOwner::Method {
                owner,
                name,
                location,
            } => FrameHeading::Method {
                owner: owner.clone(),
                name: name.clone(),
                location: location.clone(),
            },
            FrameOwner::Function { construct, source } => FrameHeading::Function {
                construct: *construct,
                excerpt: source
                    .as_deref()
                    .map(|text| SourceExcerpt::from_source(text, self.source_code_line_limit)),
            },
        };
        let bindings = frame
            .arguments
            .iter()
            .chain(frame.locals.iter())
            .cloned()
            .collect();
        FrameEntry { heading, bindings }
    }
}

fn is_skippable(frame: &StackFrame, catalog: &dyn TypeCatalog) -> bool {
    frame
        .method_name()
        .is_some_and(|(owner, name)| name == "new" && catalog.is_error_type(owner))
}

fn is_control_flow_helper(frame: &StackFrame, catalog: &dyn TypeCatalog) -> bool {
    frame
        .method_name()
        .is_some_and(|(owner, name)| catalog.is_control_flow_helper(owner, name))
}
