use std::collections::BTreeMap;
use std::sync::Arc;

use super::{DutyCall, DutyOptions, DutyTable};
use crate::action::{ActionTable, Dispatchable};
use crate::error::CoreError;
use crate::registry::Registry;
use crate::store::Store;

/// What a running duty can reach: dispatch, other duties and the tables.
#[derive(Debug, Clone)]
pub struct StoreKit {
    registry: Registry,
    scope: Option<String>,
}

impl StoreKit {
    pub(super) fn new(registry: Registry, scope: Option<String>) -> Self {
        Self { registry, scope }
    }

    /// Store the duty was run for, if any.
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn dispatch(&self, payload: impl Into<Dispatchable>) -> Result<(), CoreError> {
        self.registry.dispatch(payload)
    }

    pub fn call_of(&self) -> CallOf {
        CallOf::new(self.registry.clone(), self.scope.clone())
    }

    pub fn actions(&self) -> Arc<BTreeMap<String, ActionTable>> {
        self.registry.actions_by_store()
    }

    /// Action creators of one store; empty for unknown stores.
    pub fn actions_of(&self, store_name: &str) -> ActionTable {
        self.registry
            .actions_by_store()
            .get(store_name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn duties(&self) -> Arc<BTreeMap<String, DutyTable>> {
        self.registry.duties_by_store()
    }

    pub fn duties_of(&self, store_name: &str) -> DutyTable {
        self.registry
            .duties_by_store()
            .get(store_name)
            .cloned()
            .unwrap_or_default()
    }

    /// Current snapshot, which may be newer than the one the duty started with.
    pub fn store(&self) -> Store {
        self.registry.store()
    }
}

/// Runs registered duties by name.
#[derive(Debug, Clone)]
pub struct CallOf {
    registry: Registry,
    scope: Option<String>,
}

impl CallOf {
    pub(crate) fn new(registry: Registry, scope: Option<String>) -> Self {
        Self { registry, scope }
    }

    /// Run duty `duty_name`.
    ///
    /// The duty is looked up in this caller's store, else in `options.store`.
    /// Without either, the first store in name order that defines it is used.
    ///
    /// # Errors
    /// `UnknownDuty` when no matching duty is registered.
    pub fn call(&self, duty_name: &str, options: &DutyOptions) -> Result<DutyCall, CoreError> {
        let duties = self.registry.duties_by_store();
        let requested = self.scope.as_deref().or(options.store.as_deref());

        let found = match requested {
            Some(store_name) => duties
                .get(store_name)
                .and_then(|table| table.get(duty_name))
                .map(|duty| (store_name.to_string(), duty.clone())),
            None => duties.iter().find_map(|(store_name, table)| {
                table
                    .get(duty_name)
                    .map(|duty| (store_name.clone(), duty.clone()))
            }),
        };

        let Some((store_name, duty)) = found else {
            return Err(CoreError::UnknownDuty {
                scope: requested.map_or_else(|| "any store".to_string(), |s| format!("store '{}'", s)),
                duty: duty_name.to_string(),
            });
        };

        tracing::debug!(store = %store_name, duty = %duty_name, "Calling duty");
        let options = DutyOptions {
            store: Some(store_name),
            ..options.clone()
        };
        Ok(self.registry.run_duty(&duty, &options))
    }
}
