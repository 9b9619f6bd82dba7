//! Full-text document synchronisation.

use std::cell::RefCell;
use std::rc::Rc;

use lsp_types::notification::{
    DidChangeTextDocument, DidCloseTextDocument, DidOpenTextDocument, Notification as _,
};
use lsp_types::{DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams};
use serde_json::{Value, json};
use tracing::debug;

use super::PROVIDER_TARGET;
use crate::capability::ClientCapability;
use crate::dispatch::Reply;
use crate::documents::DocumentRegistry;
use crate::provider::{
    DescriptorError, Provider, ProviderDescriptor, ProviderError, ProviderFactory, parse_params,
};

/// Creates the full-text synchronisation provider.
pub struct TextSyncFactory {
    descriptor: ProviderDescriptor,
    documents: Rc<RefCell<dyn DocumentRegistry>>,
}

impl TextSyncFactory {
    /// Builds the factory.
    ///
    /// # Errors
    ///
    /// Propagates descriptor validation failures.
    pub fn new(documents: Rc<RefCell<dyn DocumentRegistry>>) -> Result<Self, DescriptorError> {
        let descriptor = ProviderDescriptor::new([
            DidOpenTextDocument::METHOD,
            DidChangeTextDocument::METHOD,
            DidCloseTextDocument::METHOD,
        ])?
        .with_client_capability("textDocument.synchronization")?
        .with_server_capability("textDocumentSync")?;
        Ok(Self {
            descriptor,
            documents,
        })
    }
}

impl ProviderFactory for TextSyncFactory {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn instantiate(&self, _capability: &ClientCapability) -> Box<dyn Provider> {
        Box::new(TextSyncProvider {
            documents: Rc::clone(&self.documents),
        })
    }
}

/// Keeps the document registry in step with the client.
struct TextSyncProvider {
    documents: Rc<RefCell<dyn DocumentRegistry>>,
}

impl TextSyncProvider {
    fn did_change(&self, method: &str, params: Value) -> Result<(), ProviderError> {
        let params: DidChangeTextDocumentParams = parse_params(method, params)?;
        let uri = params.text_document.uri.as_str();
        // Full sync: the last change carries the whole text.
        let Some(change) = params.content_changes.into_iter().last() else {
            return Ok(());
        };
        if self
            .documents
            .borrow_mut()
            .update(uri, change.text, params.text_document.version)
        {
            Ok(())
        } else {
            Err(ProviderError::unknown_document(uri))
        }
    }
}

impl Provider for TextSyncProvider {
    fn options(&self) -> Option<Value> {
        Some(json!({ "openClose": true, "change": 1 }))
    }

    fn handle(&mut self, method: &str, params: Value) -> Result<Reply, ProviderError> {
        match method {
            DidOpenTextDocument::METHOD => {
                let params: DidOpenTextDocumentParams = parse_params(method, params)?;
                let item = params.text_document;
                debug!(target: PROVIDER_TARGET, uri = item.uri.as_str(), "document opened");
                self.documents
                    .borrow_mut()
                    .open(item.uri.as_str(), item.text, item.version);
            }
            DidChangeTextDocument::METHOD => self.did_change(method, params)?,
            DidCloseTextDocument::METHOD => {
                let params: DidCloseTextDocumentParams = parse_params(method, params)?;
                self.documents
                    .borrow_mut()
                    .close(params.text_document.uri.as_str());
            }
            other => {
                return Err(ProviderError::failed(format!(
                    "text sync does not handle '{other}'"
                )));
            }
        }
        Ok(Reply::Immediate(Value::Null))
    }
}
