//! Method routing to negotiated providers.
//!
//! The dispatcher owns the providers enabled for one session and maps each of
//! their method names to the owning provider. Handler failures are converted
//! to [`DispatchError`] at this boundary so they never escape as panics or
//! untyped errors.

mod errors;

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::deferred::DeferredResult;
use crate::registry::RegisteredProvider;

pub use self::errors::DispatchError;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// What a handler produced.
#[derive(Debug)]
pub enum Reply {
    /// The result is available now.
    Immediate(Value),
    /// The result will be resolved on a later scheduler turn.
    Deferred(DeferredResult),
}

/// Routes requests to the providers enabled for a session.
#[derive(Debug, Default)]
pub struct RequestDispatcher {
    providers: Vec<RegisteredProvider>,
    routes: HashMap<String, usize>,
}

impl RequestDispatcher {
    /// Builds routes for `providers`.
    #[must_use]
    pub fn new(providers: Vec<RegisteredProvider>) -> Self {
        let mut routes = HashMap::new();
        for (index, provider) in providers.iter().enumerate() {
            for method in provider.descriptor().method_names() {
                routes.insert(method.clone(), index);
            }
        }
        Self { providers, routes }
    }

    /// Returns `true` when an enabled provider declares `method`.
    #[must_use]
    pub fn handles(&self, method: &str) -> bool {
        self.routes.contains_key(method)
    }

    /// Routes `method` to its provider.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownMethod`] when no enabled provider
    /// declares the method, and [`DispatchError::InvalidParams`] or
    /// [`DispatchError::Provider`] when the handler fails.
    pub fn dispatch(&mut self, method: &str, params: Value) -> Result<Reply, DispatchError> {
        let provider = self
            .routes
            .get(method)
            .and_then(|index| self.providers.get_mut(*index))
            .ok_or_else(|| DispatchError::unknown_method(method))?;

        debug!(target: DISPATCH_TARGET, method, "dispatching request");
        provider
            .provider_mut()
            .handle(method, params)
            .map_err(|error| DispatchError::from_provider(method, error))
    }
}

#[cfg(test)]
mod tests;
