//! Language server core for a live interpreter.
//!
//! The server exposes interpreter features as pluggable providers. Each
//! provider declares the methods it answers, the client capability that
//! enables it, and where its options live in the server capability tree.
//! During `initialize` the [`ProviderRegistry`] instantiates the providers a
//! client enables and builds the advertised capabilities; the
//! [`RequestDispatcher`] then routes each request to its provider.
//!
//! Handlers may answer immediately or return a deferred result that a
//! continuation on the [`Scheduler`] resolves later. The [`Session`] flushes
//! resolved results after every scheduler turn, so each request is answered
//! exactly once.
//!
//! Everything runs on one thread. Shared collaborators are `Rc<RefCell<_>>`.
//!
//! Hosts embedding an interpreter usually need only [`run_stdio`], which
//! installs logging from a loaded `Config` and serves until the client exits.

mod capability;
mod deferred;
mod dispatch;
mod documents;
mod jsonrpc;
mod provider;
pub mod providers;
mod registry;
mod runtime;
mod scheduler;
mod server;
mod session;
pub mod telemetry;
mod transport;
mod uri;

pub use capability::{
    CapabilityPath, CapabilityPathError, ClientCapability, ServerCapabilities,
};
pub use deferred::{DeferredResult, HandlerResult, Resolver, deferred};
pub use dispatch::{DispatchError, Reply, RequestDispatcher};
pub use documents::{Document, DocumentRegistry, DocumentStore, SymbolIndex, SymbolTable};
pub use jsonrpc::{
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, Message, Notification,
    PARSE_ERROR, Request, RequestId, Response, ResponseError, SERVER_NOT_INITIALIZED,
};
pub use provider::{
    DescriptorError, Provider, ProviderDescriptor, ProviderError, ProviderFactory, parse_params,
};
pub use registry::{Negotiation, ProviderRegistry, RegisteredProvider, RegistryError};
pub use runtime::{RunError, build_session, run_stdio};
pub use scheduler::Scheduler;
pub use server::{serve, serve_stdio};
pub use session::{CoordinationPort, NetworkInitError, SERVER_NAME, Session, SessionError};
pub use transport::{FramedTransport, MAX_MESSAGE_BYTES, TransportError};
pub use uri::uri_to_path;

#[cfg(test)]
mod tests;
