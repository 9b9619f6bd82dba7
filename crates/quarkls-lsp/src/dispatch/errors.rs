//! Error types for request dispatch failures.
//!
//! Each variant maps onto a JSON-RPC error code so the session can always
//! answer a failed request with a structured error response.

use serde_json::json;
use thiserror::Error;

use crate::jsonrpc::{INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND, ResponseError};
use crate::provider::ProviderError;

/// Errors surfaced while routing a request to its provider.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No enabled provider declares the method.
    #[error("unknown method: {method}")]
    UnknownMethod {
        /// Requested method.
        method: String,
    },
    /// The provider rejected the parameters.
    #[error("invalid params for '{method}': {message}")]
    InvalidParams {
        /// Requested method.
        method: String,
        /// Description of the mismatch.
        message: String,
    },
    /// The provider handler failed.
    #[error("provider failed handling '{method}': {source}")]
    Provider {
        /// Requested method.
        method: String,
        /// Handler failure.
        #[source]
        source: ProviderError,
    },
}

impl DispatchError {
    /// Creates an unknown method error.
    #[must_use]
    pub fn unknown_method(method: impl Into<String>) -> Self {
        Self::UnknownMethod {
            method: method.into(),
        }
    }

    /// Converts a handler failure raised while serving `method`.
    #[must_use]
    pub fn from_provider(method: &str, source: ProviderError) -> Self {
        match source {
            ProviderError::InvalidParams { message, .. } => Self::InvalidParams {
                method: method.to_owned(),
                message,
            },
            other => Self::Provider {
                method: method.to_owned(),
                source: other,
            },
        }
    }

    /// JSON-RPC error code for this failure.
    #[must_use]
    pub fn code(&self) -> i64 {
        match self {
            Self::UnknownMethod { .. } => METHOD_NOT_FOUND,
            Self::InvalidParams { .. } => INVALID_PARAMS,
            Self::Provider { .. } => INTERNAL_ERROR,
        }
    }

    /// Builds the error object sent to the client.
    ///
    /// Provider failures carry `{"error": <message>}` as data.
    #[must_use]
    pub fn to_response_error(&self) -> ResponseError {
        let error = ResponseError::new(self.code(), self.to_string());
        match self {
            Self::Provider { source, .. } => {
                error.with_data(json!({ "error": source.to_string() }))
            }
            Self::UnknownMethod { .. } | Self::InvalidParams { .. } => error,
        }
    }
}
