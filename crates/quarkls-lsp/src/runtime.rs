//! Wiring from loaded configuration to a serving session.

use std::cell::RefCell;
use std::rc::Rc;

use quarkls_config::Config;
use quarkls_eval::{EvaluationEngine, Interpreter};
use thiserror::Error;
use tracing::info;

use crate::documents::{DocumentStore, SymbolIndex};
use crate::providers::ProviderContext;
use crate::registry::RegistryError;
use crate::scheduler::Scheduler;
use crate::server::serve_stdio;
use crate::session::{SERVER_NAME, Session, SessionError};
use crate::telemetry::{self, TelemetryError};

const RUNTIME_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::runtime");

/// Errors that stop the server before or while serving.
#[derive(Debug, Error)]
pub enum RunError {
    /// Logging could not be installed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The built-in providers could not be registered.
    #[error("failed to register built-in providers: {source}")]
    Registry {
        /// Underlying registration error.
        #[source]
        source: RegistryError,
    },
    /// The session loop failed.
    #[error("session failed: {source}")]
    Session {
        /// Underlying transport or serialisation error.
        #[source]
        source: SessionError,
    },
}

/// Builds a session serving the built-in providers over `interpreter`.
///
/// The engine starts from `config.evaluation`, startup files come from
/// `config.startup`, and configuration changes are read from
/// `config.settings_section`.
///
/// # Errors
///
/// Returns [`RegistryError`] if the built-ins fail to register.
pub fn build_session<I, S>(
    config: &Config,
    interpreter: I,
    symbols: S,
) -> Result<Session, RegistryError>
where
    I: Interpreter + 'static,
    S: SymbolIndex + 'static,
{
    let engine = EvaluationEngine::new(interpreter, config.evaluation().clone());
    let context = ProviderContext {
        documents: Rc::new(RefCell::new(DocumentStore::new())),
        symbols: Rc::new(symbols),
        evaluator: Rc::new(RefCell::new(engine)),
        scheduler: Scheduler::new(),
        settings_section: config.settings_section().to_owned(),
    };
    Session::with_builtins(context, config.startup().clone())
}

/// Installs logging from `config`, then serves a session over stdio until
/// the client exits or stdin closes.
///
/// # Errors
///
/// Returns [`RunError`] when logging, registration or the session loop
/// fails.
pub fn run_stdio<I, S>(config: &Config, interpreter: I, symbols: S) -> Result<(), RunError>
where
    I: Interpreter + 'static,
    S: SymbolIndex + 'static,
{
    let handle =
        telemetry::initialise(config).map_err(|source| RunError::Telemetry { source })?;
    info!(
        target: RUNTIME_TARGET,
        server = SERVER_NAME,
        version = env!("CARGO_PKG_VERSION"),
        log_format = %handle.format(),
        settings_section = config.settings_section(),
        "starting language server"
    );
    let mut session = build_session(config, interpreter, symbols)
        .map_err(|source| RunError::Registry { source })?;
    serve_stdio(&mut session).map_err(|source| RunError::Session { source })?;
    info!(target: RUNTIME_TARGET, "language server stopped");
    Ok(())
}
