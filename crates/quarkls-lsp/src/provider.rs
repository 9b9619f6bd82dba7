//! Provider contracts: static descriptors, per-session instances, and the
//! factories that create them during negotiation.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::capability::{CapabilityPath, CapabilityPathError, ClientCapability};
use crate::dispatch::Reply;

/// Immutable description of one provider type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    method_names: Vec<String>,
    client_capability_path: Option<CapabilityPath>,
    server_capability_path: Option<CapabilityPath>,
}

/// Reasons a descriptor cannot be built.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DescriptorError {
    /// No method names were given.
    #[error("provider declares no methods")]
    NoMethods,
    /// A method name was empty.
    #[error("provider declares an empty method name")]
    EmptyMethodName,
    /// A capability path was malformed.
    #[error(transparent)]
    InvalidPath(#[from] CapabilityPathError),
}

impl ProviderDescriptor {
    /// Builds a descriptor handling `method_names` that is always enabled and
    /// contributes no server capability.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError`] when the list is empty or contains an
    /// empty name.
    pub fn new<I, S>(method_names: I) -> Result<Self, DescriptorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let method_names: Vec<String> = method_names.into_iter().map(Into::into).collect();
        if method_names.is_empty() {
            return Err(DescriptorError::NoMethods);
        }
        if method_names.iter().any(String::is_empty) {
            return Err(DescriptorError::EmptyMethodName);
        }
        Ok(Self {
            method_names,
            client_capability_path: None,
            server_capability_path: None,
        })
    }

    /// Requires the client to declare a capability at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::InvalidPath`] for malformed paths.
    pub fn with_client_capability(mut self, path: &str) -> Result<Self, DescriptorError> {
        self.client_capability_path = Some(CapabilityPath::parse(path)?);
        Ok(self)
    }

    /// Publishes the provider's options at `path` in the server tree.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::InvalidPath`] for malformed paths.
    pub fn with_server_capability(mut self, path: &str) -> Result<Self, DescriptorError> {
        self.server_capability_path = Some(CapabilityPath::parse(path)?);
        Ok(self)
    }

    /// Handled method names, in declaration order.
    #[must_use]
    pub fn method_names(&self) -> &[String] {
        &self.method_names
    }

    /// Client capability gating the provider; `None` means always enabled.
    #[must_use]
    pub fn client_capability_path(&self) -> Option<&CapabilityPath> {
        self.client_capability_path.as_ref()
    }

    /// Server capability entry; `None` means the provider contributes none.
    #[must_use]
    pub fn server_capability_path(&self) -> Option<&CapabilityPath> {
        self.server_capability_path.as_ref()
    }
}

/// Failures raised inside a provider handler.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The parameters did not match the method.
    #[error("invalid params for '{method}': {message}")]
    InvalidParams {
        /// Method being handled.
        method: String,
        /// Description of the mismatch.
        message: String,
    },
    /// The referenced document is not open.
    #[error("unknown document: {uri}")]
    UnknownDocument {
        /// Document identifier.
        uri: String,
    },
    /// The handler failed for another reason.
    #[error("{message}")]
    Failed {
        /// Description of the failure.
        message: String,
    },
}

impl ProviderError {
    /// Creates an invalid params error.
    #[must_use]
    pub fn invalid_params(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParams {
            method: method.into(),
            message: message.into(),
        }
    }

    /// Creates an unknown document error.
    #[must_use]
    pub fn unknown_document(uri: impl Into<String>) -> Self {
        Self::UnknownDocument { uri: uri.into() }
    }

    /// Creates a generic handler failure.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Deserialises `params` for `method`, mapping failures to
/// [`ProviderError::InvalidParams`].
///
/// # Errors
///
/// Returns [`ProviderError::InvalidParams`] when `params` does not match `T`.
pub fn parse_params<T: DeserializeOwned>(method: &str, params: Value) -> Result<T, ProviderError> {
    serde_json::from_value(params)
        .map_err(|error| ProviderError::invalid_params(method, error.to_string()))
}

/// A provider instance living for one session.
pub trait Provider {
    /// Options published in the server capability tree. `None` contributes
    /// nothing.
    fn options(&self) -> Option<Value>;

    /// Handles one of the provider's methods.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the request cannot be served.
    fn handle(&mut self, method: &str, params: Value) -> Result<Reply, ProviderError>;
}

/// Creates provider instances for sessions whose client enables them.
pub trait ProviderFactory {
    /// Static description of the provider.
    fn descriptor(&self) -> &ProviderDescriptor;

    /// Instantiates the provider with the negotiated client capability.
    fn instantiate(&self, capability: &ClientCapability) -> Box<dyn Provider>;
}
