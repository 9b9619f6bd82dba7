//! Unit tests for request routing.

use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::jsonrpc::{INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND};
use crate::registry::ProviderRegistry;
use crate::tests::support::EchoFactory;

#[fixture]
fn registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry
        .register(EchoFactory::new(&["echo/one", "echo/two"]))
        .expect("registration succeeds");
    registry
        .register(
            EchoFactory::new(&["textDocument/definition"])
                .client("textDocument.definition")
                .server("definitionProvider", json!(true)),
        )
        .expect("registration succeeds");
    registry
}

fn dispatcher_for(registry: &ProviderRegistry, client: &Value) -> RequestDispatcher {
    let (providers, _) = registry.negotiate(client).into_parts();
    RequestDispatcher::new(providers)
}

#[rstest]
fn routes_to_the_declaring_provider(registry: ProviderRegistry) {
    let mut dispatcher = dispatcher_for(&registry, &json!({}));

    let reply = dispatcher
        .dispatch("echo/two", json!({"x": 1}))
        .expect("dispatch succeeds");

    let Reply::Immediate(value) = reply else {
        panic!("expected an immediate reply");
    };
    assert_eq!(value["method"], "echo/two");
    assert_eq!(value["params"], json!({"x": 1}));
}

#[rstest]
fn disabled_provider_methods_are_unknown(registry: ProviderRegistry) {
    let mut dispatcher = dispatcher_for(&registry, &json!({}));

    assert!(!dispatcher.handles("textDocument/definition"));
    let error = dispatcher
        .dispatch("textDocument/definition", json!({}))
        .expect_err("method is not routed");

    assert!(matches!(error, DispatchError::UnknownMethod { .. }));
    assert_eq!(error.code(), METHOD_NOT_FOUND);
}

#[rstest]
fn enabled_gated_provider_is_routed(registry: ProviderRegistry) {
    let mut dispatcher =
        dispatcher_for(&registry, &json!({"textDocument": {"definition": {"linkSupport": true}}}));

    let reply = dispatcher
        .dispatch("textDocument/definition", json!({}))
        .expect("dispatch succeeds");

    let Reply::Immediate(value) = reply else {
        panic!("expected an immediate reply");
    };
    assert_eq!(value["capability"], json!({"linkSupport": true}));
}

#[rstest]
fn parameter_errors_map_to_invalid_params(registry: ProviderRegistry) {
    let mut dispatcher = dispatcher_for(&registry, &json!({}));

    let error = dispatcher
        .dispatch("echo/one", json!({"fail": "params"}))
        .expect_err("provider rejects params");

    assert!(matches!(error, DispatchError::InvalidParams { .. }));
    assert_eq!(error.to_response_error().code, INVALID_PARAMS);
}

#[rstest]
fn handler_failures_become_structured_errors(registry: ProviderRegistry) {
    let mut dispatcher = dispatcher_for(&registry, &json!({}));

    let error = dispatcher
        .dispatch("echo/one", json!({"fail": "backend exploded"}))
        .expect_err("provider fails");
    let response = error.to_response_error();

    assert_eq!(response.code, INTERNAL_ERROR);
    assert_eq!(response.data, Some(json!({"error": "backend exploded"})));
}
