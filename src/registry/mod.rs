//! Application context: the live store plus the lookup tables built at boot.
//!
//! One [`Registry`] per application root. It is a cheap cloneable handle, so
//! the dispatch engine, duties and controllers each hold their own copy.
//! Locks are only held while reading or swapping a field, except the commit
//! lock which serializes read-reduce-swap so concurrent dispatches never
//! overwrite each other. Reducers therefore must not dispatch. Selectors,
//! listeners and duties always run unlocked.

mod selectors;

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use uuid::Uuid;

use crate::action::{ActionTable, Dispatchable};
use crate::config::{parse_configs, ConfigNode, ConfigSet, StoreConfig, StorePath};
use crate::controller::Fiber;
use crate::duty::{CallOf, Duty, DutyCall, DutyExecutor, DutyOptions, DutyTable};
use crate::engine::{self, CyclePhase, ReduceContext, Root, UpdateCycle};
use crate::error::CoreError;
use crate::reducer::ReducerTable;
use crate::settings::Settings;
use crate::store::Store;

pub use selectors::{Selection, Selector};

use selectors::SelectorTable;

/// Low-level state transition published by the mounted root.
pub type RootDispatch = Arc<dyn Fn(Dispatchable) -> Result<(), CoreError> + Send + Sync>;

/// Last value a controller's render produced, readable by name.
pub type ControllerValue = Arc<dyn Any + Send + Sync>;

#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    id: Uuid,
    configured: AtomicBool,
    store: RwLock<Store>,
    commit: Mutex<()>,
    tables: RwLock<Tables>,
    selectors: Mutex<SelectorTable>,
    // Mounted controller names; `None` until the first render finishes.
    controllers: Mutex<HashMap<String, Option<ControllerValue>>>,
    root_dispatch: RwLock<Option<RootDispatch>>,
    cycle: Mutex<UpdateCycle>,
    fiber: Mutex<Option<Fiber>>,
}

/// Read-only tables, swapped wholesale so readers can clone them cheaply.
#[derive(Clone, Default)]
struct Tables {
    configs: Arc<IndexMap<String, StoreConfig>>,
    paths: Arc<BTreeMap<String, StorePath>>,
    reducers: Arc<BTreeMap<String, ReducerTable>>,
    duties: Arc<BTreeMap<String, DutyTable>>,
    actions: Arc<BTreeMap<String, ActionTable>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                id: Uuid::new_v4(),
                configured: AtomicBool::new(false),
                store: RwLock::new(Store::new()),
                commit: Mutex::new(()),
                tables: RwLock::new(Tables::default()),
                selectors: Mutex::new(SelectorTable::default()),
                controllers: Mutex::new(HashMap::new()),
                root_dispatch: RwLock::new(None),
                cycle: Mutex::new(UpdateCycle::new()),
                fiber: Mutex::new(None),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn is_configured(&self) -> bool {
        self.inner.configured.load(Ordering::Acquire)
    }

    // ------------------------------------------------------------------
    // Boot
    // ------------------------------------------------------------------

    /// Parse `configs`, seed the store and mount the root entry point.
    ///
    /// # Errors
    /// Configuration errors from parsing, or `DuplicateRegistration` when
    /// this registry was already configured.
    pub fn configure_root(&self, configs: impl Into<ConfigNode>) -> Result<Root, CoreError> {
        self.configure_root_with(configs, &Settings::default())
    }

    /// [`Registry::configure_root`] with store overrides and engine limits
    /// taken from `settings`.
    pub fn configure_root_with(
        &self,
        configs: impl Into<ConfigNode>,
        settings: &Settings,
    ) -> Result<Root, CoreError> {
        settings.validate()?;
        let set = settings.apply(parse_configs(configs)?)?;

        if self.inner.configured.swap(true, Ordering::AcqRel) {
            return Err(CoreError::DuplicateRegistration { registry: self.id() });
        }

        self.assign_store(set.initial_store());
        self.assign_reducers(set.reducers_by_store());
        self.assign_duties(set.duties_by_store());
        self.assign_actions(set.actions_by_store());
        let stores = set.len();
        self.assign_configurations(set);

        tracing::info!(registry = %self.id(), stores, "Root configured");
        Ok(Root::mount(self.clone(), settings.engine.max_update_cycles))
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Current store snapshot.
    pub fn store(&self) -> Store {
        self.inner.store.read().clone()
    }

    /// Current value of one store's slice.
    pub fn slice_of(&self, store_name: &str) -> Option<Value> {
        let path = self.inner.tables.read().paths.get(store_name).cloned()?;
        self.store().get(&path).map(|slice| slice.as_ref().clone())
    }

    pub fn reducers_by_store(&self) -> Arc<BTreeMap<String, ReducerTable>> {
        Arc::clone(&self.inner.tables.read().reducers)
    }

    pub fn duties_by_store(&self) -> Arc<BTreeMap<String, DutyTable>> {
        Arc::clone(&self.inner.tables.read().duties)
    }

    pub fn actions_by_store(&self) -> Arc<BTreeMap<String, ActionTable>> {
        Arc::clone(&self.inner.tables.read().actions)
    }

    pub fn root_dispatch(&self) -> Option<RootDispatch> {
        self.inner.root_dispatch.read().clone()
    }

    pub fn get_store_config(&self, name: &str) -> Option<StoreConfig> {
        self.inner.tables.read().configs.get(name).cloned()
    }

    /// Selectors of `controller_id` in registration order.
    pub fn get_selectors(&self, controller_id: &str) -> IndexMap<String, Selector> {
        self.inner.selectors.lock().get(controller_id)
    }

    pub fn cycle_phase(&self) -> CyclePhase {
        self.inner.cycle.lock().phase()
    }

    // ------------------------------------------------------------------
    // Mutators
    // ------------------------------------------------------------------

    pub fn assign_store(&self, store: Store) {
        *self.inner.store.write() = store;
    }

    pub fn assign_reducers(&self, reducers: BTreeMap<String, ReducerTable>) {
        self.inner.tables.write().reducers = Arc::new(reducers);
    }

    pub fn assign_duties(&self, duties: BTreeMap<String, DutyTable>) {
        self.inner.tables.write().duties = Arc::new(duties);
    }

    pub fn assign_actions(&self, actions: BTreeMap<String, ActionTable>) {
        self.inner.tables.write().actions = Arc::new(actions);
    }

    pub fn assign_configurations(&self, configs: ConfigSet) {
        let paths = configs
            .iter()
            .map(|config| (config.name().to_string(), config.path()))
            .collect();
        let configs = configs
            .into_configs()
            .map(|config| (config.name().to_string(), config))
            .collect();

        let mut tables = self.inner.tables.write();
        tables.configs = Arc::new(configs);
        tables.paths = Arc::new(paths);
    }

    pub fn assign_root_dispatch(&self, root_dispatch: RootDispatch) {
        *self.inner.root_dispatch.write() = Some(root_dispatch);
    }

    pub(crate) fn take_root_dispatch(&self) -> Option<RootDispatch> {
        self.inner.root_dispatch.write().take()
    }

    /// Register `selector` for `controller_id` and return its key.
    ///
    /// # Errors
    /// `DuplicateSelector` if this very selector is already registered for
    /// the controller.
    pub fn assign_selector(&self, controller_id: &str, selector: Selector) -> Result<String, CoreError> {
        let key = self.inner.selectors.lock().assign(controller_id, selector)?;
        tracing::trace!(controller = %controller_id, key = %key, "Selector assigned");
        Ok(key)
    }

    /// Remove one selector. Unknown controllers and keys are ignored.
    pub fn remove_selector(&self, controller_id: &str, key: &str) -> bool {
        self.inner.selectors.lock().remove(controller_id, key)
    }

    /// Remove every selector of `controller_id`; returns how many were dropped.
    pub fn remove_controller(&self, controller_id: &str) -> usize {
        let removed = self.inner.selectors.lock().remove_controller(controller_id);
        if removed > 0 {
            tracing::trace!(controller = %controller_id, removed, "Controller selectors removed");
        }
        removed
    }

    /// Value published by the last render of controller `name`.
    pub fn controller_value(&self, name: &str) -> Option<ControllerValue> {
        self.inner.controllers.lock().get(name).cloned().flatten()
    }

    /// Reserve `name` for a mounting controller.
    ///
    /// # Errors
    /// `DuplicateController` while another controller holds the name.
    pub(crate) fn claim_controller(&self, name: &str) -> Result<(), CoreError> {
        let mut controllers = self.inner.controllers.lock();
        if controllers.contains_key(name) {
            return Err(CoreError::DuplicateController {
                name: name.to_string(),
            });
        }
        controllers.insert(name.to_string(), None);
        Ok(())
    }

    pub(crate) fn publish_controller_value(&self, name: &str, value: ControllerValue) {
        if let Some(slot) = self.inner.controllers.lock().get_mut(name) {
            *slot = Some(value);
        }
    }

    pub(crate) fn release_controller(&self, name: &str) {
        self.inner.controllers.lock().remove(name);
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    /// Dispatch an action or chain.
    ///
    /// While an update is being committed the payload is queued and replayed
    /// once the update settles. Otherwise it goes to the published root
    /// dispatch, or is applied directly when no root is mounted.
    pub fn dispatch(&self, payload: impl Into<Dispatchable>) -> Result<(), CoreError> {
        let handed_back = self.inner.cycle.lock().defer(payload.into());
        let Some(payload) = handed_back else {
            tracing::debug!(registry = %self.id(), "Dispatch deferred until the update settles");
            return Ok(());
        };

        match self.root_dispatch() {
            Some(root_dispatch) => root_dispatch(payload),
            None => {
                self.apply(&payload);
                Ok(())
            }
        }
    }

    /// Dispatch a JSON action object or array of action objects.
    pub fn dispatch_value(&self, value: Value) -> Result<(), CoreError> {
        self.dispatch(Dispatchable::from_value(value)?)
    }

    /// Reduce `payload` into the store right away; returns whether the
    /// snapshot changed.
    ///
    /// Applications are serialized, each one reducing the snapshot the
    /// previous one committed.
    pub fn apply(&self, payload: &Dispatchable) -> bool {
        let tables = self.inner.tables.read().clone();
        let ctx = ReduceContext {
            paths: &tables.paths,
            reducers: &tables.reducers,
        };

        let _commit = self.inner.commit.lock();
        let current = self.store();
        let next = engine::reduce(ctx, &current, payload);
        if next.ptr_eq(&current) {
            return false;
        }
        self.assign_store(next);
        true
    }

    pub(crate) fn with_cycle<R>(&self, f: impl FnOnce(&mut UpdateCycle) -> R) -> R {
        f(&mut self.inner.cycle.lock())
    }

    // ------------------------------------------------------------------
    // Duties
    // ------------------------------------------------------------------

    /// Duty caller scoped to `store_name`, or to any store when `None`.
    pub fn get_call_of(&self, store_name: Option<&str>) -> CallOf {
        CallOf::new(self.clone(), store_name.map(str::to_string))
    }

    pub fn run_duty(&self, duty: &Duty, options: &DutyOptions) -> DutyCall {
        DutyExecutor::new(self.clone()).run(duty, options)
    }

    // ------------------------------------------------------------------
    // Controller fiber
    // ------------------------------------------------------------------

    pub(crate) fn swap_fiber(&self, fiber: Option<Fiber>) -> Option<Fiber> {
        std::mem::replace(&mut *self.inner.fiber.lock(), fiber)
    }

    /// Run `f` on the fiber being rendered, if any.
    pub(crate) fn with_fiber<R>(&self, f: impl FnOnce(&mut Fiber) -> R) -> Option<R> {
        self.inner.fiber.lock().as_mut().map(f)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("id", &self.inner.id)
            .field("configured", &self.is_configured())
            .finish_non_exhaustive()
    }
}
