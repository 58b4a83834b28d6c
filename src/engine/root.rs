//! Root entry point mounted at the top of the render tree.
//!
//! Update cycle:
//!
//! ```text
//! dispatch ──→ reduce ──→ changed? ──no──→ done
//!                            │yes
//!                            ▼
//!                   begin ─→ notify listeners ─→ finish
//!                                                  │
//!                       queued payloads ◀──────────┘
//!                            │
//!                            └──→ reduce as one batch, repeat
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::cycle::UpdateCycle;
use super::error::DispatchError;
use crate::action::Dispatchable;
use crate::config::ConfigNode;
use crate::error::CoreError;
use crate::registry::{Registry, RootDispatch};
use crate::store::Store;

type Listener = Arc<dyn Fn(&Store) + Send + Sync>;

/// Handle returned by [`Root::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Entry point returned by `configure_root`.
///
/// Owns the listeners notified once per committed update and publishes the
/// root dispatch into the registry. Dropping the last handle unpublishes it,
/// after which dispatches reduce without notifying anyone.
#[derive(Clone)]
pub struct Root {
    inner: Arc<RootInner>,
}

struct RootInner {
    registry: Registry,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_listener: AtomicU64,
    max_cycles: u32,
}

impl Drop for RootInner {
    fn drop(&mut self) {
        self.registry.take_root_dispatch();
    }
}

impl Root {
    pub(crate) fn mount(registry: Registry, max_cycles: u32) -> Root {
        let root = Root {
            inner: Arc::new(RootInner {
                registry,
                listeners: Mutex::new(Vec::new()),
                next_listener: AtomicU64::new(0),
                max_cycles,
            }),
        };
        root.publish();
        root
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Current store snapshot.
    pub fn store(&self) -> Store {
        self.inner.registry.store()
    }

    /// Call `listener` with the new snapshot after every committed update.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Store) + Send + Sync + 'static,
    {
        let id = ListenerId(self.inner.next_listener.fetch_add(1, Ordering::Relaxed));
        self.inner.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn dispatch(&self, payload: impl Into<Dispatchable>) -> Result<(), CoreError> {
        self.inner.registry.dispatch(payload)
    }

    /// Open the in-flight window and republish the root dispatch.
    ///
    /// Dispatches issued until [`Root::end_update`] are queued.
    pub fn begin_update(&self) {
        self.inner.registry.with_cycle(UpdateCycle::begin);
        self.publish();
    }

    /// Close the in-flight window and replay the queued dispatches in order.
    ///
    /// Returns how many were replayed.
    pub fn end_update(&self) -> Result<usize, CoreError> {
        let drained = self.inner.registry.with_cycle(UpdateCycle::finish);
        let replayed = drained.len();
        if replayed > 0 {
            tracing::debug!(replayed, "Replaying dispatches deferred during the update");
        }
        for payload in drained {
            self.inner.registry.dispatch(payload)?;
        }
        Ok(replayed)
    }

    fn publish(&self) {
        let weak: Weak<RootInner> = Arc::downgrade(&self.inner);
        let root_dispatch: RootDispatch = Arc::new(move |payload| match weak.upgrade() {
            Some(inner) => Root { inner }.commit(payload),
            None => {
                tracing::warn!("Root dispatch called after the root was dropped");
                Ok(())
            }
        });
        self.inner.registry.assign_root_dispatch(root_dispatch);
    }

    fn commit(&self, payload: Dispatchable) -> Result<(), CoreError> {
        let registry = &self.inner.registry;
        let mut batch = vec![payload];
        let mut cycles: u32 = 0;

        loop {
            let changed = batch
                .iter()
                .fold(false, |changed, payload| registry.apply(payload) || changed);
            if !changed {
                return Ok(());
            }

            cycles += 1;
            if cycles > self.inner.max_cycles {
                registry.with_cycle(UpdateCycle::clear);
                tracing::error!(
                    registry = %registry.id(),
                    cycles = self.inner.max_cycles,
                    "Store updates did not settle"
                );
                return Err(DispatchError::UpdateLoop {
                    cycles: self.inner.max_cycles,
                }
                .into());
            }

            batch = self.notify(&registry.store());
            if batch.is_empty() {
                return Ok(());
            }
            tracing::debug!(pending = batch.len(), cycle = cycles, "Replaying deferred dispatches");
        }
    }

    /// Notify listeners inside an in-flight window and return whatever they
    /// dispatched.
    fn notify(&self, store: &Store) -> Vec<Dispatchable> {
        let registry = &self.inner.registry;
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        registry.with_cycle(UpdateCycle::begin);
        let reset = scopeguard::guard_on_unwind((), |()| {
            registry.with_cycle(UpdateCycle::abort);
        });
        for listener in &listeners {
            listener(store);
        }
        drop(reset);

        registry.with_cycle(UpdateCycle::finish)
    }
}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Root")
            .field("registry", &self.inner.registry)
            .field("listeners", &self.inner.listeners.lock().len())
            .finish()
    }
}

/// Boot a fresh registry from `configs`.
pub fn configure_root(configs: impl Into<ConfigNode>) -> Result<Root, CoreError> {
    Registry::new().configure_root(configs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::config::StoreConfig;
    use serde_json::{json, Value};
    use std::sync::atomic::AtomicUsize;

    fn counter() -> StoreConfig {
        StoreConfig::builder("counter")
            .initial_state(json!({ "value": 0 }))
            .reducer("increase_value", |state, _| {
                let value = state["value"].as_i64().unwrap_or(0);
                Arc::new(json!({ "value": value + 1 }))
            })
            .reducer("noop", |state, _| Arc::clone(state))
            .build()
            .unwrap()
    }

    #[test]
    fn listeners_run_once_per_change() {
        let root = configure_root(counter()).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        root.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        root.dispatch(Action::new("counter", "increase_value", Value::Null)).unwrap();
        root.dispatch(Action::new("counter", "noop", Value::Null)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let root = configure_root(counter()).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let id = root.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        assert!(root.unsubscribe(id));
        assert!(!root.unsubscribe(id));

        root.dispatch(Action::new("counter", "increase_value", Value::Null)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn begin_and_end_update_replay_queue() {
        let root = configure_root(counter()).unwrap();
        root.begin_update();
        root.dispatch(Action::new("counter", "increase_value", Value::Null)).unwrap();
        root.dispatch(Action::new("counter", "increase_value", Value::Null)).unwrap();
        assert_eq!(root.registry().slice_of("counter"), Some(json!({ "value": 0 })));

        assert_eq!(root.end_update().unwrap(), 2);
        assert_eq!(root.registry().slice_of("counter"), Some(json!({ "value": 2 })));
    }

    #[test]
    fn dropping_root_unpublishes_dispatch() {
        let registry = Registry::new();
        let root = registry.configure_root(counter()).unwrap();
        assert!(registry.root_dispatch().is_some());
        drop(root);
        assert!(registry.root_dispatch().is_none());

        registry
            .dispatch(Action::new("counter", "increase_value", Value::Null))
            .unwrap();
        assert_eq!(registry.slice_of("counter"), Some(json!({ "value": 1 })));
    }
}
