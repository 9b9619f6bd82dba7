//! Unit tests for provider registration and negotiation.

use rstest::rstest;
use serde_json::{Value, json};

use super::*;
use crate::tests::support::EchoFactory;

#[rstest]
fn duplicate_method_is_rejected() {
    let mut registry = ProviderRegistry::new();
    registry
        .register(EchoFactory::new(&["a/one", "a/two"]))
        .expect("first registration succeeds");

    let result = registry.register(EchoFactory::new(&["b/one", "a/two"]));

    assert_eq!(
        result,
        Err(RegistryError::DuplicateMethod {
            method: String::from("a/two")
        })
    );
    assert_eq!(registry.len(), 1);
}

#[rstest]
#[case("completionProvider", "completionProvider")]
#[case("completionProvider", "completionProvider.resolveProvider")]
#[case("completionProvider.resolveProvider", "completionProvider")]
fn colliding_server_paths_are_rejected(#[case] first: &str, #[case] second: &str) {
    let mut registry = ProviderRegistry::new();
    registry
        .register(EchoFactory::new(&["a"]).server(first, json!(true)))
        .expect("first registration succeeds");

    let result = registry.register(EchoFactory::new(&["b"]).server(second, json!(true)));

    assert!(matches!(
        result,
        Err(RegistryError::CapabilityCollision { .. })
    ));
}

#[rstest]
fn shared_prefix_providers_merge_under_one_object() {
    let mut registry = ProviderRegistry::new();
    registry
        .register(
            EchoFactory::new(&["completion/trigger"])
                .server("completionProvider.triggerCharacters", json!(["."])),
        )
        .expect("registration succeeds");
    registry
        .register(
            EchoFactory::new(&["completion/resolve"])
                .server("completionProvider.resolveProvider", json!(true)),
        )
        .expect("registration succeeds");

    let negotiation = registry.negotiate(&json!({}));

    assert_eq!(
        Value::Object(negotiation.server_capabilities().clone()),
        json!({"completionProvider": {"triggerCharacters": ["."], "resolveProvider": true}})
    );
}

#[rstest]
fn absent_client_capability_skips_instantiation() {
    let gated = EchoFactory::new(&["textDocument/definition"])
        .client("textDocument.definition")
        .server("definitionProvider", json!(true));
    let instantiations = gated.instantiations();
    let mut registry = ProviderRegistry::new();
    registry.register(gated).expect("registration succeeds");

    let negotiation = registry.negotiate(&json!({"textDocument": {"hover": {}}}));

    assert_eq!(instantiations.get(), 0);
    assert!(negotiation.providers().is_empty());
    assert!(negotiation.server_capabilities().is_empty());
}

#[rstest]
fn declared_capability_is_handed_to_the_provider() {
    let gated = EchoFactory::new(&["textDocument/definition"]).client("textDocument.definition");
    let instantiations = gated.instantiations();
    let mut registry = ProviderRegistry::new();
    registry.register(gated).expect("registration succeeds");

    let negotiation =
        registry.negotiate(&json!({"textDocument": {"definition": {"linkSupport": true}}}));

    assert_eq!(instantiations.get(), 1);
    let provider = negotiation.providers().first().expect("provider enabled");
    assert_eq!(
        provider.capability(),
        &ClientCapability::Declared(json!({"linkSupport": true}))
    );
}

#[rstest]
fn providers_keep_registration_order() {
    let mut registry = ProviderRegistry::new();
    for method in ["z", "a", "m"] {
        registry
            .register(EchoFactory::new(&[method]))
            .expect("registration succeeds");
    }

    let negotiation = registry.negotiate(&Value::Null);
    let order: Vec<&str> = negotiation
        .providers()
        .iter()
        .filter_map(|provider| provider.descriptor().method_names().first())
        .map(String::as_str)
        .collect();

    assert_eq!(order, ["z", "a", "m"]);
}

#[rstest]
fn negotiating_twice_is_idempotent() {
    let mut registry = ProviderRegistry::new();
    registry
        .register(
            EchoFactory::new(&["textDocument/definition"])
                .client("textDocument.definition")
                .server("definitionProvider", json!(true)),
        )
        .expect("registration succeeds");
    registry
        .register(EchoFactory::new(&["eval"]).server("experimental.evaluationProvider", json!({})))
        .expect("registration succeeds");
    let client = json!({"textDocument": {"definition": {}}});

    let first = registry.negotiate(&client);
    let second = registry.negotiate(&client);

    assert_eq!(first.server_capabilities(), second.server_capabilities());
    assert_eq!(first.providers().len(), second.providers().len());
}
