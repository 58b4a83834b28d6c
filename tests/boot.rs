mod common;

use common::{counter, counter_at};
use controducer::{
    combine_stores, configure_root, ConfigError, ConfigNode, CoreError, Registry, StorePath,
};
use serde_json::json;

/// Configuring the same registry twice fails on the second call.
#[test]
fn test_second_configure_root_is_rejected() {
    let registry = Registry::new();
    let _root = registry.configure_root(counter("counter")).unwrap();

    let err = registry.configure_root(counter("other")).unwrap_err();
    assert!(matches!(err, CoreError::DuplicateRegistration { .. }));
    // The first configuration stays in place.
    assert!(registry.get_store_config("counter").is_some());
    assert!(registry.get_store_config("other").is_none());
}

#[test]
fn test_independent_registries_coexist() {
    let first = configure_root(counter("counter")).unwrap();
    let second = configure_root(counter("counter")).unwrap();
    assert_ne!(first.registry().id(), second.registry().id());

    first
        .dispatch(controducer::Action::new("counter", "add", 4))
        .unwrap();
    assert_eq!(first.registry().slice_of("counter"), Some(json!({ "value": 4 })));
    assert_eq!(second.registry().slice_of("counter"), Some(json!({ "value": 0 })));
}

#[test]
fn test_boot_seeds_initial_state_and_tables() {
    let combined = combine_stores(
        ConfigNode::branch([("a", counter("a")), ("b", counter_at("b", ["deep", "b"]))]),
        None,
    )
    .unwrap()
    .reset_root("app");
    let root = configure_root(combined).unwrap();
    let registry = root.registry();

    assert_eq!(
        root.store().to_value(),
        json!({ "app": { "a": { "value": 0 }, "deep": { "b": { "value": 0 } } } })
    );
    assert_eq!(
        registry.get_store_config("b").unwrap().path(),
        StorePath::from(["app", "deep", "b"])
    );

    let actions = registry.actions_by_store();
    assert_eq!(actions["a"].len(), 4);
    assert!(registry.reducers_by_store()["b"].contains_key("keep"));
    assert!(registry.duties_by_store()["a"].is_empty());
    assert!(registry.root_dispatch().is_some());
}

#[test]
fn test_duplicate_names_fail_boot() {
    let err = configure_root(vec![counter("a"), counter("a")]).unwrap_err();
    assert!(matches!(
        err,
        CoreError::Config(ConfigError::DuplicateName { ref name }) if name == "a"
    ));
}

#[test]
fn test_missing_name_is_rejected() {
    let err = controducer::StoreConfig::builder("").build().unwrap_err();
    assert!(matches!(err, ConfigError::MissingName));
}
