//! Strongly typed reducers running over the dynamic store.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Slice;

/// Marker trait for typed slice state.
///
/// States should be:
/// - Immutable (Clone to create new states)
/// - Comparable (PartialEq, an equal result keeps the stored slice)
/// - Serializable to and from the slice JSON
pub trait SliceState: Clone + PartialEq + Default + Serialize + DeserializeOwned + Send + 'static {}

/// Marker trait for typed action payloads.
pub trait Intent: DeserializeOwned + Send + 'static {}

/// Reducer transforms state based on intents.
///
/// It must be a pure function: (State, Intent) -> State
pub trait TypedReducer {
    type State: SliceState;
    type Intent: Intent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State;
}

pub(super) fn reduce_typed<R: TypedReducer>(slice: &Slice, payload: &Value) -> Slice {
    let state = if slice.is_null() {
        R::State::default()
    } else {
        match R::State::deserialize(slice.as_ref()) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "Slice does not match the typed reducer state");
                return Arc::clone(slice);
            }
        }
    };

    let intent = match R::Intent::deserialize(payload) {
        Ok(intent) => intent,
        Err(e) => {
            tracing::warn!(error = %e, "Payload does not match the typed reducer intent");
            return Arc::clone(slice);
        }
    };

    let next = R::reduce(state.clone(), intent);
    if next == state {
        return Arc::clone(slice);
    }

    match serde_json::to_value(&next) {
        Ok(value) => Arc::new(value),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode typed reducer state");
            Arc::clone(slice)
        }
    }
}
