//! Built-in providers.
//!
//! | provider | client capability | server capability |
//! |----------|-------------------|-------------------|
//! | text sync | `textDocument.synchronization` | `textDocumentSync` |
//! | definition | `textDocument.definition` | `definitionProvider` |
//! | evaluate selection | always | `experimental.evaluationProvider` |
//! | configuration | always | none |

mod configuration;
mod definition;
mod evaluation;
mod text_sync;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use quarkls_eval::Evaluator;

use crate::documents::{DocumentRegistry, SymbolIndex};
use crate::registry::{ProviderRegistry, RegistryError};
use crate::scheduler::Scheduler;

pub use self::configuration::ConfigurationFactory;
pub use self::definition::{DefinitionFactory, word_at};
pub use self::evaluation::{EVALUATE_SELECTION_METHOD, EvaluationFactory};
pub use self::text_sync::TextSyncFactory;

/// Tracing target for built-in providers.
pub(crate) const PROVIDER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::providers");

/// Shared collaborators handed to built-in providers.
#[derive(Clone)]
pub struct ProviderContext {
    /// Open documents.
    pub documents: Rc<RefCell<dyn DocumentRegistry>>,
    /// Definition index.
    pub symbols: Rc<dyn SymbolIndex>,
    /// Evaluation engine.
    pub evaluator: Rc<RefCell<dyn Evaluator>>,
    /// Continuation queue for deferred work.
    pub scheduler: Scheduler,
    /// Client settings section read on configuration changes.
    pub settings_section: String,
}

impl fmt::Debug for ProviderContext {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ProviderContext")
            .field("scheduler", &self.scheduler)
            .field("settings_section", &self.settings_section)
            .finish_non_exhaustive()
    }
}

/// Registers every built-in provider in a fixed order.
///
/// # Errors
///
/// Returns [`RegistryError`] if a built-in clashes with a provider already in
/// `registry`.
pub fn register_builtin(
    registry: &mut ProviderRegistry,
    context: &ProviderContext,
) -> Result<(), RegistryError> {
    registry.register(TextSyncFactory::new(Rc::clone(&context.documents))?)?;
    registry.register(DefinitionFactory::new(
        Rc::clone(&context.documents),
        Rc::clone(&context.symbols),
    )?)?;
    registry.register(EvaluationFactory::new(
        Rc::clone(&context.evaluator),
        context.scheduler.clone(),
    )?)?;
    registry.register(ConfigurationFactory::new(
        Rc::clone(&context.evaluator),
        context.settings_section.clone(),
    )?)?;
    Ok(())
}
