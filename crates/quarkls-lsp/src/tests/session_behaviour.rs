//! Behaviour-driven tests for the session lifecycle.

use std::cell::RefCell;

use quarkls_config::StartupSettings;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};

use crate::jsonrpc::{Message, Notification, Request, RequestId, Response};
use crate::session::Session;

use super::support::{Collaborators, scripted_interpreter, symbol_table};

#[derive(Default)]
struct TestWorld {
    session: Option<Session>,
    collaborators: Option<Collaborators>,
    next_id: i64,
    responses: Vec<Response>,
    capabilities: Value,
}

impl TestWorld {
    fn session(&mut self) -> &mut Session {
        self.session.as_mut().expect("session has been created")
    }

    fn send_request(&mut self, method: &str, params: Value) {
        self.next_id += 1;
        let message = Message::Request(Request {
            id: RequestId::Number(self.next_id),
            method: method.to_owned(),
            params,
        });
        self.responses = self.session().handle(message);
    }

    fn send_notification(&mut self, method: &str) {
        let message = Message::Notification(Notification {
            method: method.to_owned(),
            params: Value::Null,
        });
        self.responses = self.session().handle(message);
    }

    fn only_response(&self) -> &Response {
        assert_eq!(self.responses.len(), 1, "expected one response");
        self.responses.first().expect("one response")
    }
}

#[fixture]
fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::default())
}

#[given("a session serving the built-in providers")]
fn given_session(world: &RefCell<TestWorld>) {
    let collaborators = Collaborators::new(scripted_interpreter(), symbol_table());
    let session = Session::with_builtins(collaborators.context(), StartupSettings::default())
        .expect("built-ins register");
    let mut world = world.borrow_mut();
    world.session = Some(session);
    world.collaborators = Some(collaborators);
}

#[when("the client requests {method} before initialising")]
fn when_request_early(world: &RefCell<TestWorld>, method: String) {
    world
        .borrow_mut()
        .send_request(method.trim_matches('"'), json!({}));
}

#[when("the client initialises with definition support")]
fn when_initialise(world: &RefCell<TestWorld>) {
    let mut world = world.borrow_mut();
    world.send_request(
        "initialize",
        json!({ "capabilities": { "textDocument": { "definition": {} } } }),
    );
    let result = world.only_response().result.clone().expect("initialize succeeds");
    world.capabilities = result["capabilities"].clone();
    world.send_notification("initialized");
}

#[when("the client evaluates {source}")]
fn when_evaluate(world: &RefCell<TestWorld>, source: String) {
    world.borrow_mut().send_request(
        "textDocument/evaluateSelection",
        json!({
            "textDocument": { "uri": "file:///work/patch.scd" },
            "sourceCode": source.trim_matches('"'),
        }),
    );
}

#[when("the client shuts down and exits")]
fn when_shutdown(world: &RefCell<TestWorld>) {
    let mut world = world.borrow_mut();
    world.send_request("shutdown", Value::Null);
    assert_eq!(world.only_response().result, Some(Value::Null));
    world.send_notification("exit");
}

#[then("the response carries error code {code}")]
fn then_error_code(world: &RefCell<TestWorld>, code: i64) {
    let world = world.borrow();
    let error = world.only_response().error.as_ref().expect("an error response");
    assert_eq!(error.code, code);
}

#[then("the advertised capabilities include {key}")]
fn then_capability_present(world: &RefCell<TestWorld>, key: String) {
    let world = world.borrow();
    assert!(world.capabilities.get(key.trim_matches('"')).is_some());
}

#[then("the advertised capabilities omit {key}")]
fn then_capability_absent(world: &RefCell<TestWorld>, key: String) {
    let world = world.borrow();
    assert!(world.capabilities.get(key.trim_matches('"')).is_none());
}

#[then("no response is sent before the next turn")]
fn then_nothing_yet(world: &RefCell<TestWorld>) {
    assert!(world.borrow().responses.is_empty());
}

#[then("the evaluation result is {value}")]
fn then_evaluation_result(world: &RefCell<TestWorld>, value: String) {
    let mut world = world.borrow_mut();
    let mut flushed = Vec::new();
    while world.session().has_pending_work() {
        flushed.extend(world.session().run_turn());
    }
    world.responses = flushed;
    let result = world.only_response().result.clone();
    assert_eq!(result, Some(json!({ "result": value.trim_matches('"') })));

    let journal = &world.collaborators.as_ref().expect("collaborators exist").journal;
    assert_eq!(journal.compiled().len(), 1);
}

#[then("the session is finished")]
fn then_finished(world: &RefCell<TestWorld>) {
    let mut world = world.borrow_mut();
    assert!(world.responses.is_empty());
    assert!(world.session().is_finished());
}

#[scenario(path = "tests/features/session_lifecycle.feature")]
fn session_lifecycle_behaviour(world: RefCell<TestWorld>) {
    let _ = world;
}
