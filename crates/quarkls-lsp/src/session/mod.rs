//! Protocol session: lifecycle, negotiation and response flushing.
//!
//! A [`Session`] accepts parsed [`Message`]s one at a time and returns the
//! responses that are ready. Requests other than `initialize` are rejected
//! with `-32002` until the client has initialised. Requests answered with a
//! deferred result are parked and flushed by [`Session::run_turn`] once they
//! resolve.

mod initialize;
mod network;
mod startup;

use camino::Utf8PathBuf;
use lsp_types::notification::{Exit, Initialized, Notification as _};
use lsp_types::request::{Initialize, Request as _, Shutdown};
use quarkls_config::StartupSettings;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::deferred::DeferredResult;
use crate::dispatch::{DispatchError, Reply, RequestDispatcher};
use crate::jsonrpc::{
    INVALID_PARAMS, INVALID_REQUEST, Message, Notification, Request, RequestId, Response,
    ResponseError, SERVER_NOT_INITIALIZED,
};
use crate::providers::{self, ProviderContext};
use crate::registry::{ProviderRegistry, RegistryError};
use crate::transport::TransportError;

use self::initialize::InitializeParams;
pub use self::network::{CoordinationPort, NetworkInitError};

/// Tracing target for session lifecycle events.
pub(crate) const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// Name reported in `serverInfo`.
pub const SERVER_NAME: &str = "quarkls";

/// Errors that end a session loop.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading or writing a framed message failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A response could not be serialised.
    #[error("failed to serialise response: {0}")]
    Serialise(#[from] serde_json::Error),
}

#[derive(Debug)]
enum Phase {
    AwaitingInitialize,
    Running(RequestDispatcher),
    ShutDown,
    Exited,
}

/// One client connection's protocol state.
#[derive(Debug)]
pub struct Session {
    registry: ProviderRegistry,
    context: ProviderContext,
    startup: StartupSettings,
    phase: Phase,
    pending: Vec<(RequestId, DeferredResult)>,
    workspace_roots: Vec<Utf8PathBuf>,
    coordination: Option<CoordinationPort>,
}

impl Session {
    /// Creates a session over an already populated registry.
    #[must_use]
    pub fn new(
        registry: ProviderRegistry,
        context: ProviderContext,
        startup: StartupSettings,
    ) -> Self {
        Self {
            registry,
            context,
            startup,
            phase: Phase::AwaitingInitialize,
            pending: Vec::new(),
            workspace_roots: Vec::new(),
            coordination: None,
        }
    }

    /// Creates a session serving the built-in providers.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the built-ins fail to register.
    pub fn with_builtins(
        context: ProviderContext,
        startup: StartupSettings,
    ) -> Result<Self, RegistryError> {
        let mut registry = ProviderRegistry::new();
        providers::register_builtin(&mut registry, &context)?;
        Ok(Self::new(registry, context, startup))
    }

    /// Returns `true` once the client has sent `exit`.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Exited)
    }

    /// Returns `true` when continuations are queued or a resolved result is
    /// waiting to be flushed.
    #[must_use]
    pub fn has_pending_work(&self) -> bool {
        self.context.scheduler.pending() > 0
            || self.pending.iter().any(|(_, result)| result.is_resolved())
    }

    /// Workspace roots announced by the client.
    #[must_use]
    pub fn workspace_roots(&self) -> &[Utf8PathBuf] {
        &self.workspace_roots
    }

    /// Coordination port bound during `initialize`, if any.
    #[must_use]
    pub fn coordination_port(&self) -> Option<u16> {
        self.coordination.as_ref().map(CoordinationPort::port)
    }

    /// Handles one inbound message, returning the responses ready now.
    pub fn handle(&mut self, message: Message) -> Vec<Response> {
        match message {
            Message::Request(request) => self.handle_request(request).into_iter().collect(),
            Message::Notification(notification) => {
                self.handle_notification(notification);
                Vec::new()
            }
            Message::Response { id } => {
                debug!(target: SESSION_TARGET, ?id, "ignoring client response");
                Vec::new()
            }
        }
    }

    /// Runs one scheduler turn and flushes every resolved deferred result.
    pub fn run_turn(&mut self) -> Vec<Response> {
        self.context.scheduler.run_turn();
        let mut responses = Vec::new();
        self.pending.retain(|(id, result)| match result.take() {
            Some(outcome) => {
                responses.push(Response::from_result(id.clone(), outcome));
                false
            }
            None => true,
        });
        responses
    }

    fn handle_request(&mut self, request: Request) -> Option<Response> {
        let Request { id, method, params } = request;
        if method == Initialize::METHOD {
            return Some(self.initialize(id, params));
        }

        let dispatcher = match &mut self.phase {
            Phase::Running(dispatcher) => dispatcher,
            Phase::AwaitingInitialize => {
                return Some(Response::failure(
                    Some(id),
                    ResponseError::new(SERVER_NOT_INITIALIZED, "server is not initialised"),
                ));
            }
            Phase::ShutDown | Phase::Exited => {
                return Some(Response::failure(
                    Some(id),
                    ResponseError::new(INVALID_REQUEST, "server is shutting down"),
                ));
            }
        };

        if method == Shutdown::METHOD {
            info!(target: SESSION_TARGET, "shutdown requested");
            self.phase = Phase::ShutDown;
            return Some(Response::success(id, Value::Null));
        }

        match dispatcher.dispatch(&method, params) {
            Ok(Reply::Immediate(value)) => Some(Response::success(id, value)),
            Ok(Reply::Deferred(result)) => {
                self.pending.push((id, result));
                None
            }
            Err(error) => {
                debug!(target: SESSION_TARGET, %error, %id, "request failed");
                Some(Response::failure(Some(id), error.to_response_error()))
            }
        }
    }

    fn handle_notification(&mut self, notification: Notification) {
        let Notification { method, params } = notification;
        if method == Exit::METHOD {
            info!(target: SESSION_TARGET, "exit received");
            self.phase = Phase::Exited;
            return;
        }
        if method == Initialized::METHOD {
            debug!(target: SESSION_TARGET, "client initialised");
            return;
        }

        let Phase::Running(dispatcher) = &mut self.phase else {
            debug!(
                target: SESSION_TARGET,
                method = %method,
                "notification outside running session dropped"
            );
            return;
        };
        match dispatcher.dispatch(&method, params) {
            Ok(Reply::Immediate(_)) => {}
            Ok(Reply::Deferred(_)) => {
                debug!(
                    target: SESSION_TARGET,
                    method = %method,
                    "deferred result for a notification discarded"
                );
            }
            Err(DispatchError::UnknownMethod { .. }) => {
                debug!(target: SESSION_TARGET, method = %method, "unhandled notification");
            }
            Err(error) => warn!(target: SESSION_TARGET, %error, "notification failed"),
        }
    }

    fn initialize(&mut self, id: RequestId, params: Value) -> Response {
        if !matches!(self.phase, Phase::AwaitingInitialize) {
            return Response::failure(
                Some(id),
                ResponseError::new(INVALID_REQUEST, "server is already initialised"),
            );
        }
        let params = match InitializeParams::parse(params) {
            Ok(params) => params,
            Err(error) => {
                return Response::failure(
                    Some(id),
                    ResponseError::new(INVALID_PARAMS, error.to_string()),
                );
            }
        };

        let (providers, capabilities) = self.registry.negotiate(&params.capabilities).into_parts();
        self.phase = Phase::Running(RequestDispatcher::new(providers));
        self.workspace_roots = params.workspace_roots();

        let options = params.options();
        if let Some((first, last)) = options.suggested_server_port_range {
            match CoordinationPort::bind(first, last) {
                Ok(port) => {
                    info!(target: SESSION_TARGET, port = port.port(), "coordination port bound");
                    self.coordination = Some(port);
                }
                Err(error) => {
                    warn!(target: SESSION_TARGET, %error, "continuing without coordination port");
                }
            }
        }

        let files = startup::startup_files(&self.startup, &options, &self.workspace_roots);
        startup::schedule(&self.context.scheduler, &self.context.evaluator, files);

        info!(
            target: SESSION_TARGET,
            roots = self.workspace_roots.len(),
            "session initialised"
        );
        Response::success(
            id,
            json!({
                "capabilities": capabilities,
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION"),
                },
            }),
        )
    }
}
