//! Shared test fixtures.

#![allow(dead_code, unused_imports)]

use controducer::logging::{self, LogTarget};
use controducer::{StoreConfig, StorePath};
use serde_json::{json, Value};
use std::sync::Arc;

/// Counter store at `path` with `increase_value`, `decrease_value`,
/// `add` (payload amount) and `keep` (identity) reducers.
pub fn counter_at(name: &str, path: impl Into<StorePath>) -> StoreConfig {
    counter_builder(name).path(path).build().expect("valid counter config")
}

/// Rootless counter store; its location comes from where it is mounted.
pub fn counter(name: &str) -> StoreConfig {
    counter_builder(name).build().expect("valid counter config")
}

/// Route engine events into the per-test captured output.
pub fn init_logging() {
    let _ = logging::try_init(LogTarget::TestWriter);
}

fn counter_builder(name: &str) -> controducer::config::StoreConfigBuilder {
    init_logging();
    StoreConfig::builder(name)
        .initial_state(json!({ "value": 0 }))
        .reducer("increase_value", |state, _| Arc::new(json!({ "value": value_of(state) + 1 })))
        .reducer("decrease_value", |state, _| Arc::new(json!({ "value": value_of(state) - 1 })))
        .reducer("add", |state, payload| {
            let amount = payload.as_i64().unwrap_or(0);
            Arc::new(json!({ "value": value_of(state) + amount }))
        })
        .reducer("keep", |state, _| Arc::clone(state))
}

pub fn value_of(state: &Value) -> i64 {
    state["value"].as_i64().unwrap_or(0)
}

/// Counter value of `name` in the registry's current store.
pub fn counter_value(registry: &controducer::Registry, name: &str) -> i64 {
    registry
        .slice_of(name)
        .map(|state| value_of(&state))
        .expect("store is registered")
}
