//! Collaborator boundaries for open documents and symbol definitions.
//!
//! Providers only see these traits. The in-memory implementations back the
//! built-in text sync provider and serve hosts without an index of their own.

use std::collections::HashMap;

use camino::Utf8PathBuf;
use lsp_types::Location;

use crate::uri::uri_to_path;

/// An open document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Local path derived from the document URI.
    pub path: Utf8PathBuf,
    /// Full current text.
    pub text: String,
    /// Client-assigned version.
    pub version: i32,
}

/// Documents resolvable by their opaque identifier.
pub trait DocumentRegistry {
    /// Records a newly opened document.
    fn open(&mut self, uri: &str, text: String, version: i32);

    /// Replaces a document's text. Returns `false` when it is not open.
    fn update(&mut self, uri: &str, text: String, version: i32) -> bool;

    /// Forgets a document.
    fn close(&mut self, uri: &str);

    /// Looks a document up.
    fn get(&self, uri: &str) -> Option<&Document>;
}

/// In-memory [`DocumentRegistry`].
#[derive(Debug, Default, Clone)]
pub struct DocumentStore {
    documents: HashMap<String, Document>,
}

impl DocumentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` when no document is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentRegistry for DocumentStore {
    fn open(&mut self, uri: &str, text: String, version: i32) {
        self.documents.insert(
            uri.to_owned(),
            Document {
                path: uri_to_path(uri),
                text,
                version,
            },
        );
    }

    fn update(&mut self, uri: &str, text: String, version: i32) -> bool {
        match self.documents.get_mut(uri) {
            Some(document) => {
                document.text = text;
                document.version = version;
                true
            }
            None => false,
        }
    }

    fn close(&mut self, uri: &str) {
        self.documents.remove(uri);
    }

    fn get(&self, uri: &str) -> Option<&Document> {
        self.documents.get(uri)
    }
}

/// Definition lookup by symbol name.
pub trait SymbolIndex {
    /// Definition sites of `name`, empty when unknown.
    fn definitions(&self, name: &str) -> Vec<Location>;
}

/// In-memory [`SymbolIndex`].
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    symbols: HashMap<String, Vec<Location>>,
}

impl SymbolTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a definition site for `name`.
    pub fn insert(&mut self, name: impl Into<String>, location: Location) {
        self.symbols.entry(name.into()).or_default().push(location);
    }
}

impl SymbolIndex for SymbolTable {
    fn definitions(&self, name: &str) -> Vec<Location> {
        self.symbols.get(name).cloned().unwrap_or_default()
    }
}
