//! Go-to-definition backed by the [`SymbolIndex`].

use std::cell::RefCell;
use std::rc::Rc;

use lsp_types::request::{GotoDefinition, Request as _};
use lsp_types::{GotoDefinitionParams, Position};
use serde_json::Value;
use tracing::debug;

use super::PROVIDER_TARGET;
use crate::capability::ClientCapability;
use crate::dispatch::Reply;
use crate::documents::{DocumentRegistry, SymbolIndex};
use crate::provider::{
    DescriptorError, Provider, ProviderDescriptor, ProviderError, ProviderFactory, parse_params,
};

/// Creates the go-to-definition provider.
pub struct DefinitionFactory {
    descriptor: ProviderDescriptor,
    documents: Rc<RefCell<dyn DocumentRegistry>>,
    symbols: Rc<dyn SymbolIndex>,
}

impl DefinitionFactory {
    /// Builds the factory.
    ///
    /// # Errors
    ///
    /// Propagates descriptor validation failures.
    pub fn new(
        documents: Rc<RefCell<dyn DocumentRegistry>>,
        symbols: Rc<dyn SymbolIndex>,
    ) -> Result<Self, DescriptorError> {
        let descriptor = ProviderDescriptor::new([GotoDefinition::METHOD])?
            .with_client_capability("textDocument.definition")?
            .with_server_capability("definitionProvider")?;
        Ok(Self {
            descriptor,
            documents,
            symbols,
        })
    }
}

impl ProviderFactory for DefinitionFactory {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn instantiate(&self, _capability: &ClientCapability) -> Box<dyn Provider> {
        Box::new(DefinitionProvider {
            documents: Rc::clone(&self.documents),
            symbols: Rc::clone(&self.symbols),
        })
    }
}

struct DefinitionProvider {
    documents: Rc<RefCell<dyn DocumentRegistry>>,
    symbols: Rc<dyn SymbolIndex>,
}

impl Provider for DefinitionProvider {
    fn options(&self) -> Option<Value> {
        Some(Value::Bool(true))
    }

    fn handle(&mut self, method: &str, params: Value) -> Result<Reply, ProviderError> {
        let params: GotoDefinitionParams = parse_params(method, params)?;
        let position = params.text_document_position_params;
        let uri = position.text_document.uri.as_str();

        let documents = self.documents.borrow();
        let document = documents
            .get(uri)
            .ok_or_else(|| ProviderError::unknown_document(uri))?;
        let locations = word_at(&document.text, position.position)
            .map(|word| {
                debug!(target: PROVIDER_TARGET, word, "looking up definition");
                self.symbols.definitions(word)
            })
            .unwrap_or_default();

        serde_json::to_value(locations)
            .map(Reply::Immediate)
            .map_err(|error| ProviderError::failed(error.to_string()))
    }
}

/// Identifier under a zero-based position whose `character` counts UTF-16
/// code units.
#[must_use]
pub fn word_at(text: &str, position: Position) -> Option<&str> {
    let line = text.lines().nth(usize::try_from(position.line).ok()?)?;
    let column = utf16_column_to_byte(line, position.character)?;

    let before = line.get(..column)?;
    let after = line.get(column..)?;
    let start = before
        .char_indices()
        .rev()
        .take_while(|(_, ch)| is_identifier_char(*ch))
        .last()
        .map_or(column, |(index, _)| index);
    let end = after
        .char_indices()
        .find(|(_, ch)| !is_identifier_char(*ch))
        .map_or(line.len(), |(index, _)| column + index);

    line.get(start..end).filter(|word| !word.is_empty())
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn utf16_column_to_byte(line: &str, character: u32) -> Option<usize> {
    let target = usize::try_from(character).ok()?;
    let mut units = 0;
    for (index, ch) in line.char_indices() {
        if units >= target {
            return Some(index);
        }
        units += ch.len_utf16();
    }
    Some(line.len())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("SinOsc.ar(440)", 0, 0, Some("SinOsc"))]
    #[case("SinOsc.ar(440)", 0, 3, Some("SinOsc"))]
    #[case("SinOsc.ar(440)", 0, 6, Some("SinOsc"))]
    #[case("SinOsc.ar(440)", 0, 7, Some("ar"))]
    #[case("a + b\n~freq_ratio * 2", 1, 4, Some("freq_ratio"))]
    #[case("x = 1;", 0, 2, None)]
    #[case("x", 3, 0, None)]
    #[case("\"é\" + Pbind", 0, 7, Some("Pbind"))]
    fn finds_identifier_under_cursor(
        #[case] text: &str,
        #[case] line: u32,
        #[case] character: u32,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(word_at(text, Position::new(line, character)), expected);
    }
}
