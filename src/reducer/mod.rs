//! Reducers: pure transitions of one store slice.
//!
//! ```text
//! Action ──→ Reducer ──→ Slice ──→ Store
//!    ↑                               │
//!    └───────────────────────────────┘
//! ```
//!
//! A reducer receives the current slice and the action payload and returns
//! the next slice. Returning the very same `Arc` means "unchanged" and keeps
//! the store snapshot identical.

mod typed;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::store::Slice;

pub use typed::{Intent, SliceState, TypedReducer};

type ReduceFn = dyn Fn(&Slice, &Value) -> Slice + Send + Sync;

/// Shared handle to a reducer function.
#[derive(Clone)]
pub struct Reducer(Arc<ReduceFn>);

/// Reducers of one store, keyed by action name.
pub type ReducerTable = BTreeMap<String, Reducer>;

impl Reducer {
    pub fn new<F>(reduce: F) -> Self
    where
        F: Fn(&Slice, &Value) -> Slice + Send + Sync + 'static,
    {
        Reducer(Arc::new(reduce))
    }

    /// Reducer over plain values.
    ///
    /// A result equal to the current value keeps the current slice.
    pub fn map<F>(reduce: F) -> Self
    where
        F: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
    {
        Reducer::new(move |slice, payload| {
            let next = reduce(slice, payload);
            if next == **slice {
                Arc::clone(slice)
            } else {
                Arc::new(next)
            }
        })
    }

    /// Reducer backed by a strongly typed [`TypedReducer`].
    pub fn typed<R>() -> Self
    where
        R: TypedReducer + 'static,
    {
        Reducer::new(typed::reduce_typed::<R>)
    }

    pub fn reduce(&self, slice: &Slice, payload: &Value) -> Slice {
        (self.0)(slice, payload)
    }

    pub fn ptr_eq(&self, other: &Reducer) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Reducer(..)")
    }
}
