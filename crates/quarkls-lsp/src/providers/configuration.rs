//! Applies client settings pushed through `workspace/didChangeConfiguration`.

use std::cell::RefCell;
use std::rc::Rc;

use lsp_types::DidChangeConfigurationParams;
use lsp_types::notification::{DidChangeConfiguration, Notification as _};
use quarkls_config::SettingsUpdate;
use quarkls_eval::Evaluator;
use serde_json::Value;
use tracing::{debug, info};

use super::PROVIDER_TARGET;
use crate::capability::ClientCapability;
use crate::dispatch::Reply;
use crate::provider::{
    DescriptorError, Provider, ProviderDescriptor, ProviderError, ProviderFactory, parse_params,
};

/// Creates the configuration provider.
pub struct ConfigurationFactory {
    descriptor: ProviderDescriptor,
    evaluator: Rc<RefCell<dyn Evaluator>>,
    section: String,
}

impl ConfigurationFactory {
    /// Builds the factory reading `settings.<section>` from each change.
    ///
    /// # Errors
    ///
    /// Propagates descriptor validation failures.
    pub fn new(
        evaluator: Rc<RefCell<dyn Evaluator>>,
        section: impl Into<String>,
    ) -> Result<Self, DescriptorError> {
        Ok(Self {
            descriptor: ProviderDescriptor::new([DidChangeConfiguration::METHOD])?,
            evaluator,
            section: section.into(),
        })
    }
}

impl ProviderFactory for ConfigurationFactory {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn instantiate(&self, _capability: &ClientCapability) -> Box<dyn Provider> {
        Box::new(ConfigurationProvider {
            evaluator: Rc::clone(&self.evaluator),
            section: self.section.clone(),
        })
    }
}

struct ConfigurationProvider {
    evaluator: Rc<RefCell<dyn Evaluator>>,
    section: String,
}

impl Provider for ConfigurationProvider {
    fn options(&self) -> Option<Value> {
        None
    }

    fn handle(&mut self, method: &str, params: Value) -> Result<Reply, ProviderError> {
        let params: DidChangeConfigurationParams = parse_params(method, params)?;
        let Some(section) = params.settings.get(&self.section).cloned() else {
            debug!(target: PROVIDER_TARGET, section = %self.section, "settings section absent");
            return Ok(Reply::Immediate(Value::Null));
        };
        let update: SettingsUpdate = parse_params(method, section)?;

        let mut evaluator = self.evaluator.borrow_mut();
        let mut settings = evaluator.settings().clone();
        settings.apply(update);
        info!(
            target: PROVIDER_TARGET,
            post_results = settings.post_results,
            improved_error_reports = settings.improved_error_reports,
            "evaluation settings updated"
        );
        evaluator.set_settings(settings);
        Ok(Reply::Immediate(Value::Null))
    }
}
