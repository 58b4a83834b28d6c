//! Dispatch engine: reduction of actions and chains over the store tree,
//! the update-cycle state machine and the root entry point.

mod cycle;
mod error;
mod root;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::action::{Action, Chain, Dispatchable};
use crate::config::StorePath;
use crate::reducer::ReducerTable;
use crate::store::Store;

pub use cycle::{CyclePhase, UpdateCycle};
pub use error::DispatchError;
pub use root::{configure_root, ListenerId, Root};

/// Lookup tables a reduction resolves actions against.
#[derive(Debug, Clone, Copy)]
pub struct ReduceContext<'a> {
    pub paths: &'a BTreeMap<String, StorePath>,
    pub reducers: &'a BTreeMap<String, ReducerTable>,
}

/// Apply a single action or a chain to `store`.
pub fn reduce(ctx: ReduceContext<'_>, store: &Store, payload: &Dispatchable) -> Store {
    match payload {
        Dispatchable::Single(action) => reduce_single(ctx, store, action),
        Dispatchable::Chain(chain) => reduce_chain(ctx, store, chain),
    }
}

/// Run the reducer named by `action` on its store's slice.
///
/// The store is returned unchanged (same root) when the store or reducer is
/// unknown, or when the reducer hands back the slice it was given.
pub fn reduce_single(ctx: ReduceContext<'_>, store: &Store, action: &Action) -> Store {
    let Some(path) = ctx.paths.get(&action.store_name) else {
        tracing::warn!(store = %action.store_name, action = %action.name, "Action targets an unknown store");
        return store.clone();
    };

    let Some(reducer) = ctx
        .reducers
        .get(&action.store_name)
        .and_then(|reducers| reducers.get(&action.name))
    else {
        tracing::debug!(store = %action.store_name, action = %action.name, "No reducer for action");
        return store.clone();
    };

    let current = store
        .get(path)
        .cloned()
        .unwrap_or_else(|| Arc::new(Value::Null));
    let next = reducer.reduce(&current, &action.payload);

    if Arc::ptr_eq(&current, &next) {
        tracing::trace!(store = %action.store_name, action = %action.name, "Reducer kept slice");
        return store.clone();
    }

    store.with_slice(path, next)
}

/// Apply every step of `chain` in order, each against the store left by the
/// previous one.
pub fn reduce_chain(ctx: ReduceContext<'_>, store: &Store, chain: &Chain) -> Store {
    chain.steps().iter().fold(store.clone(), |current, step| {
        match step.resolve(&current) {
            Some(action) => reduce_single(ctx, &current, &action),
            None => current,
        }
    })
}
