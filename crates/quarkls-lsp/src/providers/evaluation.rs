//! Evaluation of a source selection on the next scheduler turn.

use std::cell::RefCell;
use std::rc::Rc;

use lsp_types::TextDocumentIdentifier;
use quarkls_eval::Evaluator;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::PROVIDER_TARGET;
use crate::capability::ClientCapability;
use crate::deferred::deferred;
use crate::dispatch::Reply;
use crate::jsonrpc::ResponseError;
use crate::provider::{
    DescriptorError, Provider, ProviderDescriptor, ProviderError, ProviderFactory, parse_params,
};
use crate::scheduler::Scheduler;
use crate::uri::uri_to_path;

/// Custom request evaluating a selection of source text.
pub const EVALUATE_SELECTION_METHOD: &str = "textDocument/evaluateSelection";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EvaluateSelectionParams {
    text_document: TextDocumentIdentifier,
    source_code: String,
}

/// Creates the evaluate-selection provider.
pub struct EvaluationFactory {
    descriptor: ProviderDescriptor,
    evaluator: Rc<RefCell<dyn Evaluator>>,
    scheduler: Scheduler,
}

impl EvaluationFactory {
    /// Builds the factory.
    ///
    /// # Errors
    ///
    /// Propagates descriptor validation failures.
    pub fn new(
        evaluator: Rc<RefCell<dyn Evaluator>>,
        scheduler: Scheduler,
    ) -> Result<Self, DescriptorError> {
        let descriptor = ProviderDescriptor::new([EVALUATE_SELECTION_METHOD])?
            .with_server_capability("experimental.evaluationProvider")?;
        Ok(Self {
            descriptor,
            evaluator,
            scheduler,
        })
    }
}

impl ProviderFactory for EvaluationFactory {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn instantiate(&self, _capability: &ClientCapability) -> Box<dyn Provider> {
        Box::new(EvaluationProvider {
            evaluator: Rc::clone(&self.evaluator),
            scheduler: self.scheduler.clone(),
        })
    }
}

struct EvaluationProvider {
    evaluator: Rc<RefCell<dyn Evaluator>>,
    scheduler: Scheduler,
}

impl Provider for EvaluationProvider {
    fn options(&self) -> Option<Value> {
        Some(json!({}))
    }

    fn handle(&mut self, method: &str, params: Value) -> Result<Reply, ProviderError> {
        let params: EvaluateSelectionParams = parse_params(method, params)?;
        let path = uri_to_path(params.text_document.uri.as_str());
        let source = params.source_code;
        let evaluator = Rc::clone(&self.evaluator);
        let (result, resolver) = deferred();

        debug!(target: PROVIDER_TARGET, %path, "evaluation scheduled");
        self.scheduler.schedule(move || {
            let outcome = evaluator.borrow_mut().evaluate_in(Some(&path), &source);
            let value = serde_json::to_value(&outcome).map_err(|error| {
                warn!(target: PROVIDER_TARGET, %error, "failed to serialise evaluation outcome");
                ResponseError::internal(error.to_string())
            });
            resolver.resolve(value);
        });

        Ok(Reply::Deferred(result))
    }
}
