//! Doubles and fixtures shared by the registry, dispatch, provider and session
//! suites.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use lsp_types::{Location, Position, Range};
use quarkls_config::{DEFAULT_SETTINGS_SECTION, EvaluationSettings};
use quarkls_eval::test_support::{Journal, RecordingConsole, ScriptedInterpreter};
use quarkls_eval::{EvaluationEngine, Evaluator};
use serde_json::{Value, json};

use crate::capability::ClientCapability;
use crate::dispatch::Reply;
use crate::documents::{DocumentRegistry, DocumentStore, SymbolIndex, SymbolTable};
use crate::provider::{Provider, ProviderDescriptor, ProviderError, ProviderFactory};
use crate::providers::ProviderContext;
use crate::scheduler::Scheduler;

/// Factory whose providers echo every request back.
pub struct EchoFactory {
    descriptor: ProviderDescriptor,
    options: Option<Value>,
    instantiations: Rc<Cell<usize>>,
}

impl EchoFactory {
    /// Always-enabled echo provider for `methods` with no server capability.
    pub fn new(methods: &[&str]) -> Self {
        Self {
            descriptor: ProviderDescriptor::new(methods.iter().copied())
                .expect("valid method names"),
            options: None,
            instantiations: Rc::default(),
        }
    }

    /// Gates the provider on a client capability.
    pub fn client(mut self, path: &str) -> Self {
        self.descriptor = self
            .descriptor
            .with_client_capability(path)
            .expect("valid client path");
        self
    }

    /// Publishes `options` at `path`.
    pub fn server(mut self, path: &str, options: Value) -> Self {
        self.descriptor = self
            .descriptor
            .with_server_capability(path)
            .expect("valid server path");
        self.options = Some(options);
        self
    }

    /// Counter of how often the factory instantiated a provider.
    pub fn instantiations(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.instantiations)
    }
}

impl ProviderFactory for EchoFactory {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn instantiate(&self, capability: &ClientCapability) -> Box<dyn Provider> {
        self.instantiations.set(self.instantiations.get() + 1);
        Box::new(EchoProvider {
            options: self.options.clone(),
            capability: capability.value().cloned().unwrap_or(Value::Null),
        })
    }
}

struct EchoProvider {
    options: Option<Value>,
    capability: Value,
}

impl Provider for EchoProvider {
    fn options(&self) -> Option<Value> {
        self.options.clone()
    }

    fn handle(&mut self, method: &str, params: Value) -> Result<Reply, ProviderError> {
        match params.get("fail").and_then(Value::as_str) {
            Some("params") => Err(ProviderError::invalid_params(method, "rejected")),
            Some(message) => Err(ProviderError::failed(message)),
            None => Ok(Reply::Immediate(json!({
                "method": method,
                "params": params,
                "capability": self.capability,
            }))),
        }
    }
}

/// Built-in provider collaborators with concrete handles kept for assertions.
pub struct Collaborators {
    pub documents: Rc<RefCell<DocumentStore>>,
    pub symbols: Rc<SymbolTable>,
    pub engine: Rc<RefCell<EvaluationEngine<ScriptedInterpreter>>>,
    pub console: RecordingConsole,
    pub journal: Journal,
    pub scheduler: Scheduler,
}

impl Collaborators {
    /// Wires a scripted engine, an empty document store and `symbols`.
    pub fn new(interpreter: ScriptedInterpreter, symbols: SymbolTable) -> Self {
        let console = RecordingConsole::new();
        let journal = interpreter.journal();
        let engine = EvaluationEngine::new(interpreter, EvaluationSettings::default())
            .with_console(console.clone());
        Self {
            documents: Rc::new(RefCell::new(DocumentStore::new())),
            symbols: Rc::new(symbols),
            engine: Rc::new(RefCell::new(engine)),
            console,
            journal,
            scheduler: Scheduler::new(),
        }
    }

    /// Provider context sharing these collaborators.
    pub fn context(&self) -> ProviderContext {
        let documents: Rc<RefCell<dyn DocumentRegistry>> = self.documents.clone();
        let symbols: Rc<dyn SymbolIndex> = self.symbols.clone();
        let evaluator: Rc<RefCell<dyn Evaluator>> = self.engine.clone();
        ProviderContext {
            documents,
            symbols,
            evaluator,
            scheduler: self.scheduler.clone(),
            settings_section: DEFAULT_SETTINGS_SECTION.to_owned(),
        }
    }
}

/// Interpreter scripted with the sources the suites evaluate.
pub fn scripted_interpreter() -> ScriptedInterpreter {
    ScriptedInterpreter::new()
        .returns("1 + 1", "2")
        .raises("Error(\"boom\").throw", "ERROR: boom", Vec::new())
}

/// Symbol table defining `SinOsc` in `/lib/SinOsc.sc`.
pub fn symbol_table() -> SymbolTable {
    let mut table = SymbolTable::new();
    table.insert("SinOsc", sin_osc_location());
    table
}

/// Definition site registered by [`symbol_table`].
pub fn sin_osc_location() -> Location {
    Location::new(
        "file:///lib/SinOsc.sc".parse().expect("valid uri"),
        Range::new(Position::new(3, 0), Position::new(3, 6)),
    )
}
