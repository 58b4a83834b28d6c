mod common;

use common::{counter, counter_at, counter_value};
use controducer::reducer::Reducer;
use controducer::{
    configure_root, Action, Chain, ConfigNode, CoreError, DispatchError, Registry, StoreConfig,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn increment(store: &str) -> Action {
    Action::new(store, "increase_value", Value::Null)
}

/// A reducer returning the very same slice leaves the root untouched.
#[test]
fn test_identity_reducer_keeps_root() {
    let root = configure_root(counter("counter")).unwrap();
    let before = root.store();

    root.dispatch(Action::new("counter", "keep", Value::Null)).unwrap();
    assert!(root.store().ptr_eq(&before));

    root.dispatch(Action::new("counter", "missing_reducer", Value::Null)).unwrap();
    assert!(root.store().ptr_eq(&before));
}

#[test]
fn test_single_action_updates_only_its_slice() {
    let root = configure_root(ConfigNode::branch([
        ("a", counter("a")),
        ("b", counter("b")),
    ]))
    .unwrap();
    let before = root.store();

    root.dispatch(increment("a")).unwrap();
    let registry = root.registry();
    assert_eq!(counter_value(registry, "a"), 1);
    assert_eq!(counter_value(registry, "b"), 0);

    let b_path = registry.get_store_config("b").unwrap().path();
    assert!(Arc::ptr_eq(
        before.get(&b_path).unwrap(),
        root.store().get(&b_path).unwrap()
    ));
}

/// Each chain step sees the store left by the previous one.
#[test]
fn test_chain_sees_intermediate_state() {
    let root = configure_root(counter("counter")).unwrap();
    let path = root.registry().get_store_config("counter").unwrap().path();

    let chain = Chain::default()
        .then(increment("counter"))
        .then_with(move |store| {
            let value = store.get(&path).map(|s| s["value"].as_i64().unwrap_or(0));
            (value >= Some(1)).then(|| increment("counter"))
        });
    root.dispatch(chain).unwrap();

    assert_eq!(counter_value(root.registry(), "counter"), 2);
}

#[test]
fn test_chain_from_json_array() {
    let root = configure_root(counter("counter")).unwrap();
    root.registry()
        .dispatch_value(json!([
            { "storeName": "counter", "name": "add", "payload": 5 },
            { "storeName": "counter", "name": "decrease_value" }
        ]))
        .unwrap();
    assert_eq!(counter_value(root.registry(), "counter"), 4);
}

#[test]
fn test_malformed_payloads_are_rejected() {
    let root = configure_root(counter("counter")).unwrap();

    let err = root.registry().dispatch_value(json!("increase_value")).unwrap_err();
    assert!(matches!(
        err,
        CoreError::Dispatch(DispatchError::MalformedAction { .. })
    ));

    let err = Chain::from_value(json!({ "storeName": "counter", "name": "add" })).unwrap_err();
    assert!(matches!(err, DispatchError::MalformedChain { .. }));
}

/// Reducers are looked up when a payload is applied, not when it is created.
#[test]
fn test_swapped_reducer_is_honored_by_queued_action() {
    let root = configure_root(counter("counter")).unwrap();
    let registry = root.registry();

    root.begin_update();
    registry.dispatch(increment("counter")).unwrap();

    let mut reducers = (*registry.reducers_by_store()).clone();
    reducers.get_mut("counter").unwrap().insert(
        "increase_value".to_string(),
        Reducer::map(|state, _| json!({ "value": state["value"].as_i64().unwrap_or(0) + 100 })),
    );
    registry.assign_reducers(reducers);

    assert_eq!(root.end_update().unwrap(), 1);
    assert_eq!(counter_value(registry, "counter"), 100);
}

#[test]
fn test_unknown_store_is_noop() {
    let root = configure_root(counter("counter")).unwrap();
    let before = root.store();
    root.dispatch(increment("nowhere")).unwrap();
    assert!(root.store().ptr_eq(&before));
}

#[test]
fn test_nested_sub_store_dispatch() {
    let main = counter_at("main", "app");
    let combined = controducer::combine_stores(
        main,
        Some(ConfigNode::branch([("child", counter("child"))])),
    )
    .unwrap();
    let root = configure_root(combined).unwrap();

    root.dispatch(increment("child")).unwrap();
    root.dispatch(Action::new("main", "add", 10)).unwrap();

    assert_eq!(
        root.store().to_value(),
        json!({ "app": { "value": 10, "child": { "value": 1 } } })
    );
}

#[test]
fn test_registry_without_root_applies_directly() {
    let registry = Registry::new();
    let config = StoreConfig::builder("flag")
        .initial_state(false)
        .reducer("toggle", |state, _| Arc::new(Value::Bool(!state.as_bool().unwrap_or(false))))
        .build()
        .unwrap();
    let set = controducer::parse_configs(config).unwrap();
    registry.assign_store(set.initial_store());
    registry.assign_reducers(set.reducers_by_store());
    registry.assign_configurations(set);

    registry.dispatch(Action::new("flag", "toggle", Value::Null)).unwrap();
    assert_eq!(registry.slice_of("flag"), Some(Value::Bool(true)));
}
