//! Dotted capability paths, client-capability resolution, and server-capability
//! merging.
//!
//! Capability trees are plain JSON objects. A path such as
//! `textDocument.definition` names a location inside one; resolution never
//! fails, it only reports whether something non-null lives there.

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

/// Tracing target for capability negotiation.
pub(crate) const CAPABILITY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::capability");

/// Server capability tree under construction.
pub type ServerCapabilities = Map<String, Value>;

/// A validated dotted path into a capability tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CapabilityPath {
    raw: String,
}

/// Reasons a dotted path is rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid capability path '{path}': {reason}")]
pub struct CapabilityPathError {
    /// The rejected path.
    pub path: String,
    /// Why it was rejected.
    pub reason: &'static str,
}

impl CapabilityPath {
    /// Parses a dotted path, rejecting empty segments.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityPathError`] when the path is empty or any segment
    /// between dots is empty.
    pub fn parse(raw: &str) -> Result<Self, CapabilityPathError> {
        if raw.is_empty() {
            return Err(CapabilityPathError {
                path: raw.to_owned(),
                reason: "path is empty",
            });
        }
        if raw.split('.').any(str::is_empty) {
            return Err(CapabilityPathError {
                path: raw.to_owned(),
                reason: "path contains an empty segment",
            });
        }
        Ok(Self {
            raw: raw.to_owned(),
        })
    }

    /// Path segments in order.
    #[must_use]
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.raw.split('.')
    }

    /// The dotted form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns `true` when one path equals the other or is a dotted prefix of
    /// it, so merging both would overwrite one of the entries.
    #[must_use]
    pub fn collides_with(&self, other: &Self) -> bool {
        is_segment_prefix(&self.raw, &other.raw) || is_segment_prefix(&other.raw, &self.raw)
    }
}

fn is_segment_prefix(prefix: &str, path: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}

impl fmt::Display for CapabilityPath {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.raw)
    }
}

/// Outcome of resolving a provider's client capability.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCapability {
    /// The provider declares no client capability and is always enabled.
    Always,
    /// The client declared a value at the provider's path.
    Declared(Value),
}

impl ClientCapability {
    /// The declared value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Always => None,
            Self::Declared(value) => Some(value),
        }
    }
}

/// Resolves `path` against a client capability tree.
///
/// `None` for `path` yields [`ClientCapability::Always`] regardless of the
/// tree. Missing segments, non-object intermediates and `null` leaves all
/// resolve to `None`.
#[must_use]
pub fn resolve(tree: &Value, path: Option<&CapabilityPath>) -> Option<ClientCapability> {
    let Some(path) = path else {
        return Some(ClientCapability::Always);
    };
    let mut node = tree;
    for segment in path.segments() {
        node = node.as_object()?.get(segment)?;
    }
    if node.is_null() {
        None
    } else {
        Some(ClientCapability::Declared(node.clone()))
    }
}

/// Stores `options` at `path` inside `tree`, creating intermediate objects.
///
/// Does nothing when `options` is `None`. Returns the value previously held
/// at the final segment, if any.
pub fn merge_into(
    tree: &mut ServerCapabilities,
    path: &CapabilityPath,
    options: Option<Value>,
) -> Option<Value> {
    let options = options?;
    let segments: Vec<&str> = path.segments().collect();
    merge_at(tree, &segments, options, path)
}

fn merge_at(
    node: &mut ServerCapabilities,
    segments: &[&str],
    options: Value,
    path: &CapabilityPath,
) -> Option<Value> {
    match segments {
        [] => None,
        [leaf] => node.insert((*leaf).to_owned(), options),
        [head, rest @ ..] => {
            let slot = node
                .entry((*head).to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(child) = slot {
                return merge_at(child, rest, options, path);
            }
            warn!(
                target: CAPABILITY_TARGET,
                path = %path,
                segment = *head,
                "replacing capability leaf with an object"
            );
            let mut child = Map::new();
            let previous = merge_at(&mut child, rest, options, path);
            *slot = Value::Object(child);
            previous
        }
    }
}
