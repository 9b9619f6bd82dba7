//! Provider registry and per-session capability negotiation.
//!
//! The [`ProviderRegistry`] holds provider factories in registration order.
//! Registration rejects descriptors whose method names are already claimed or
//! whose server capability path would overwrite another provider's entry.
//! [`ProviderRegistry::negotiate`] then instantiates the providers a client
//! enables and builds the server capability tree returned from `initialize`.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::capability::{self, CAPABILITY_TARGET, ClientCapability, ServerCapabilities};
use crate::provider::{DescriptorError, Provider, ProviderDescriptor, ProviderFactory};

/// Configuration errors raised while registering providers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Two providers declare the same method.
    #[error("method '{method}' is already handled by another provider")]
    DuplicateMethod {
        /// The contested method name.
        method: String,
    },
    /// Two providers would write overlapping server capability entries.
    #[error("server capability '{path}' collides with registered capability '{existing}'")]
    CapabilityCollision {
        /// Path of the rejected descriptor.
        path: String,
        /// Path already registered.
        existing: String,
    },
    /// The descriptor itself is malformed.
    #[error("invalid provider descriptor: {0}")]
    InvalidDescriptor(#[from] DescriptorError),
}

/// Ordered collection of provider factories.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: Vec<Box<dyn ProviderFactory>>,
    claimed_methods: HashMap<String, usize>,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ProviderRegistry")
            .field("providers", &self.factories.len())
            .field("methods", &self.claimed_methods.len())
            .finish()
    }
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider factory.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateMethod`] when a method is already
    /// claimed and [`RegistryError::CapabilityCollision`] when the server
    /// capability path equals, or is a dotted prefix of, a registered one.
    pub fn register(&mut self, factory: impl ProviderFactory + 'static) -> Result<(), RegistryError> {
        let descriptor = factory.descriptor();

        if let Some(method) = descriptor
            .method_names()
            .iter()
            .find(|method| self.claimed_methods.contains_key(method.as_str()))
        {
            return Err(RegistryError::DuplicateMethod {
                method: method.clone(),
            });
        }

        if let Some(path) = descriptor.server_capability_path()
            && let Some(existing) = self
                .factories
                .iter()
                .filter_map(|registered| registered.descriptor().server_capability_path())
                .find(|existing| existing.collides_with(path))
        {
            return Err(RegistryError::CapabilityCollision {
                path: path.to_string(),
                existing: existing.to_string(),
            });
        }

        let index = self.factories.len();
        for method in descriptor.method_names() {
            self.claimed_methods.insert(method.clone(), index);
        }
        self.factories.push(Box::new(factory));
        Ok(())
    }

    /// Number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Instantiates the providers enabled by `client_capabilities` and builds
    /// the server capability tree.
    ///
    /// Providers are visited in registration order. Those whose client
    /// capability resolves to absent are skipped without being instantiated.
    #[must_use]
    pub fn negotiate(&self, client_capabilities: &Value) -> Negotiation {
        let mut providers = Vec::new();
        let mut server_capabilities = ServerCapabilities::new();

        for factory in &self.factories {
            let descriptor = factory.descriptor();
            let Some(client_capability) =
                capability::resolve(client_capabilities, descriptor.client_capability_path())
            else {
                debug!(
                    target: CAPABILITY_TARGET,
                    methods = ?descriptor.method_names(),
                    "client capability absent; provider disabled"
                );
                continue;
            };

            let provider = factory.instantiate(&client_capability);
            if let Some(path) = descriptor.server_capability_path() {
                capability::merge_into(&mut server_capabilities, path, provider.options());
            }
            debug!(
                target: CAPABILITY_TARGET,
                methods = ?descriptor.method_names(),
                "provider enabled"
            );
            providers.push(RegisteredProvider {
                descriptor: descriptor.clone(),
                capability: client_capability,
                provider,
            });
        }

        Negotiation {
            providers,
            server_capabilities,
        }
    }
}

/// A provider instantiated for one session.
pub struct RegisteredProvider {
    descriptor: ProviderDescriptor,
    capability: ClientCapability,
    provider: Box<dyn Provider>,
}

impl fmt::Debug for RegisteredProvider {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RegisteredProvider")
            .field("descriptor", &self.descriptor)
            .field("capability", &self.capability)
            .finish_non_exhaustive()
    }
}

impl RegisteredProvider {
    /// Static description of the provider.
    #[must_use]
    pub fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    /// Client capability the provider was enabled with.
    #[must_use]
    pub fn capability(&self) -> &ClientCapability {
        &self.capability
    }

    pub(crate) fn provider_mut(&mut self) -> &mut dyn Provider {
        self.provider.as_mut()
    }
}

/// Result of negotiating one session.
#[derive(Debug)]
pub struct Negotiation {
    providers: Vec<RegisteredProvider>,
    server_capabilities: ServerCapabilities,
}

impl Negotiation {
    /// Enabled providers, in registration order.
    #[must_use]
    pub fn providers(&self) -> &[RegisteredProvider] {
        &self.providers
    }

    /// Server capability tree advertised to the client.
    #[must_use]
    pub fn server_capabilities(&self) -> &ServerCapabilities {
        &self.server_capabilities
    }

    /// Splits the negotiation into its parts.
    #[must_use]
    pub fn into_parts(self) -> (Vec<RegisteredProvider>, ServerCapabilities) {
        (self.providers, self.server_capabilities)
    }
}

#[cfg(test)]
mod tests;
