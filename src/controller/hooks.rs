//! Hooks available while a controller renders.

use std::sync::Arc;

use serde_json::Value;

use crate::action::{Action, ActionTable, Dispatchable};
use crate::duty::CallOf;
use crate::error::CoreError;
use crate::registry::{Registry, Selector};
use crate::store::Slice;

/// Select a value from the store for the rendering controller.
///
/// Each call position keeps the selector it registered on the first render;
/// later renders at that position ignore `selector`. Removing the
/// registration through [`Registry::remove_selector`] only stops the
/// controller from tracking it.
///
/// # Errors
/// `MissingContext` outside a controller render.
pub fn use_store(registry: &Registry, selector: Selector) -> Result<Slice, CoreError> {
    let (controller, slot, slots) = registry
        .with_fiber(|fiber| {
            let slot = fiber.cursor;
            fiber.cursor += 1;
            (fiber.controller.clone(), slot, Arc::clone(&fiber.slots))
        })
        .ok_or(CoreError::MissingContext { hook: "use_store" })?;

    let cached = slots.lock().get(slot).cloned();
    let selector = match cached {
        Some(existing) => existing,
        None => {
            registry.assign_selector(controller.as_str(), selector.clone())?;
            slots.lock().push(selector.clone());
            selector
        }
    };

    Ok(selector.select(&registry.store()).into_slice())
}

/// Dispatcher scoped to `store_name`, or to the rendering controller's store.
///
/// # Errors
/// `MissingContext` outside a controller render.
pub fn use_dispatch(registry: &Registry, store_name: Option<&str>) -> Result<Dispatcher, CoreError> {
    let own_store = registry
        .with_fiber(|fiber| fiber.store_name.clone())
        .ok_or(CoreError::MissingContext { hook: "use_dispatch" })?;

    Ok(Dispatcher {
        registry: registry.clone(),
        store_name: store_name.map_or(own_store, str::to_string),
    })
}

/// Duty caller scoped to the rendering controller's store.
///
/// # Errors
/// `MissingContext` outside a controller render.
pub fn use_call_of(registry: &Registry) -> Result<CallOf, CoreError> {
    let own_store = registry
        .with_fiber(|fiber| fiber.store_name.clone())
        .ok_or(CoreError::MissingContext { hook: "use_call_of" })?;
    Ok(registry.get_call_of(Some(&own_store)))
}

/// Last value rendered by the controller of store `name`.
///
/// # Errors
/// `MissingContext` when no controller of that name has rendered yet, or
/// `ControllerValueType` when it rendered a value other than `T`.
pub fn use_controller<T>(registry: &Registry, name: &str) -> Result<Arc<T>, CoreError>
where
    T: Send + Sync + 'static,
{
    let value = registry
        .controller_value(name)
        .ok_or(CoreError::MissingContext { hook: "use_controller" })?;
    value.downcast::<T>().map_err(|_| CoreError::ControllerValueType {
        name: name.to_string(),
        expected: std::any::type_name::<T>(),
    })
}

/// Dispatch handle bound to one store.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Registry,
    store_name: String,
}

impl Dispatcher {
    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    pub fn dispatch(&self, payload: impl Into<Dispatchable>) -> Result<(), CoreError> {
        self.registry.dispatch(payload)
    }

    /// Dispatch reducer `name` of the bound store.
    pub fn send(&self, name: &str, payload: impl Into<Value>) -> Result<(), CoreError> {
        self.registry
            .dispatch(Action::new(self.store_name.clone(), name, payload))
    }

    pub fn actions(&self) -> ActionTable {
        self.registry
            .actions_by_store()
            .get(&self.store_name)
            .cloned()
            .unwrap_or_default()
    }
}
