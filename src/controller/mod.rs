//! Controllers: component-scoped bindings to the registry.
//!
//! A controller owns the selectors its subtree registered through the hooks,
//! binds itself as the current fiber while rendering, and decides whether
//! a store change requires another render.

mod hooks;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::CoreError;
use crate::registry::{Registry, Selection, Selector};
use crate::store::Slice;

pub use hooks::{use_call_of, use_controller, use_dispatch, use_store, Dispatcher};

static NEXT_CONTROLLER: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControllerId(String);

impl ControllerId {
    fn next(store_name: &str) -> Self {
        Self::with_counter(store_name, NEXT_CONTROLLER.fetch_add(1, Ordering::Relaxed))
    }

    fn with_counter(store_name: &str, n: u64) -> Self {
        ControllerId(format!("controller-{}-{}", store_name, n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Selectors held by `use_store` call position, kept across renders.
pub(crate) type HookSlots = Arc<Mutex<Vec<Selector>>>;

/// The controller currently rendering and its hook cursor.
#[derive(Debug, Clone)]
pub(crate) struct Fiber {
    pub(crate) controller: ControllerId,
    pub(crate) store_name: String,
    pub(crate) cursor: usize,
    pub(crate) slots: HookSlots,
}

/// Slices a controller's render depended on.
#[derive(Debug, Clone, Default)]
pub struct UsedStores {
    /// Compared by identity.
    pub directs: BTreeMap<String, Slice>,
    /// Compared structurally.
    pub shallows: BTreeMap<String, Slice>,
}

pub struct Controller {
    id: ControllerId,
    store_name: String,
    registry: Registry,
    slots: HookSlots,
    rendered: Mutex<Option<UsedStores>>,
}

impl Controller {
    /// Mount a controller named after its store.
    ///
    /// # Errors
    /// `DuplicateController` while another controller of the same store is
    /// alive in this registry.
    pub fn new(registry: &Registry, store_name: impl Into<String>) -> Result<Self, CoreError> {
        let store_name = store_name.into();
        registry.claim_controller(&store_name)?;
        let id = ControllerId::next(&store_name);
        tracing::trace!(controller = %id, "Controller created");
        Ok(Self {
            id,
            store_name,
            registry: registry.clone(),
            slots: HookSlots::default(),
            rendered: Mutex::new(None),
        })
    }

    pub fn id(&self) -> &ControllerId {
        &self.id
    }

    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    /// Run `render` with this controller bound as the current fiber.
    ///
    /// Hooks called inside see this controller. The previously bound fiber
    /// is restored afterwards, also when `render` panics. The output is
    /// published for [`use_controller`] and the used stores are recorded for
    /// [`Controller::needs_render`].
    pub fn render<R>(&self, render: impl FnOnce() -> R) -> R
    where
        R: Clone + Send + Sync + 'static,
    {
        let previous = self.registry.swap_fiber(Some(Fiber {
            controller: self.id.clone(),
            store_name: self.store_name.clone(),
            cursor: 0,
            slots: Arc::clone(&self.slots),
        }));
        let _restore = scopeguard::guard(previous, |previous| {
            self.registry.swap_fiber(previous);
        });

        let output = render();
        self.registry
            .publish_controller_value(&self.store_name, Arc::new(output.clone()));
        *self.rendered.lock() = Some(self.used_stores());
        output
    }

    /// Own slice plus every registered selector's selection on the current store.
    pub fn used_stores(&self) -> UsedStores {
        let store = self.registry.store();
        let mut used = UsedStores::default();

        if let Some(config) = self.registry.get_store_config(&self.store_name) {
            let slice = store
                .get(&config.path())
                .cloned()
                .unwrap_or_else(|| Arc::new(Value::Null));
            used.directs.insert(self.store_name.clone(), slice);
        }

        for (key, selector) in self.registry.get_selectors(self.id.as_str()) {
            match selector.select(&store) {
                Selection::Direct(slice) => used.directs.insert(key, slice),
                Selection::Shallow(slice) => used.shallows.insert(key, slice),
            };
        }
        used
    }

    /// Whether the store moved on since the last render.
    pub fn needs_render(&self) -> bool {
        match self.rendered.lock().as_ref() {
            Some(previous) => should_update(previous, &self.used_stores()),
            None => true,
        }
    }

    /// Drop every selector of this controller. Safe to call repeatedly.
    ///
    /// A later render registers its selectors again.
    pub fn unmount(&self) {
        self.slots.lock().clear();
        let removed = self.registry.remove_controller(self.id.as_str());
        if removed > 0 {
            tracing::debug!(controller = %self.id, removed, "Controller unmounted");
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.unmount();
        self.registry.release_controller(&self.store_name);
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("id", &self.id)
            .field("store_name", &self.store_name)
            .finish_non_exhaustive()
    }
}

/// Whether `next` differs from `prev` enough to render again.
pub fn should_update(prev: &UsedStores, next: &UsedStores) -> bool {
    let directs_same = same_keys(&prev.directs, &next.directs)
        && prev
            .directs
            .iter()
            .all(|(key, slice)| next.directs.get(key).is_some_and(|other| Arc::ptr_eq(slice, other)));

    let shallows_same = same_keys(&prev.shallows, &next.shallows)
        && prev
            .shallows
            .iter()
            .all(|(key, slice)| next.shallows.get(key).is_some_and(|other| shallow_equal(slice, other)));

    !(directs_same && shallows_same)
}

fn same_keys(a: &BTreeMap<String, Slice>, b: &BTreeMap<String, Slice>) -> bool {
    a.len() == b.len() && a.keys().all(|key| b.contains_key(key))
}

/// One level of structural comparison: same object keys or array length,
/// with equal members.
fn shallow_equal(a: &Slice, b: &Slice) -> bool {
    if Arc::ptr_eq(a, b) {
        return true;
    }
    match (a.as_ref(), b.as_ref()) {
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len() && a.iter().all(|(key, value)| b.get(key) == Some(value))
        }
        (Value::Array(a), Value::Array(b)) => a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y),
        (a, b) => a == b,
    }
}
