//! Store configuration: one named, independently reducible slice.

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use super::error::ConfigError;
use super::path::StorePath;
use crate::duty::{Duty, DutyCall, DutyTable, Lifecycle, StoreKit};
use crate::reducer::{Reducer, ReducerTable};
use crate::store::{Slice, Store};

static NEXT_CONFIG_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a configuration, shared by every re-placed copy of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigId(u64);

impl ConfigId {
    fn next() -> Self {
        ConfigId(NEXT_CONFIG_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Descriptor of one named store slice.
///
/// The resolved path is `root ++ offset`: `root` is the locally known
/// location (the explicit path it was built with, or the shared root of the
/// combination it belongs to) and `offset` is the path supplied from outside
/// when the configuration was discovered inside a larger graph.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    id: ConfigId,
    name: String,
    root: Option<StorePath>,
    offset: StorePath,
    initial_state: Value,
    reducers: ReducerTable,
    duties: DutyTable,
}

impl StoreConfig {
    pub fn builder(name: impl Into<String>) -> StoreConfigBuilder {
        StoreConfigBuilder {
            name: name.into(),
            path: None,
            initial_state: Value::Null,
            reducers: ReducerTable::new(),
            duties: DutyTable::new(),
        }
    }

    pub fn id(&self) -> ConfigId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> Option<&StorePath> {
        self.root.as_ref()
    }

    pub fn offset(&self) -> &StorePath {
        &self.offset
    }

    /// The locally known root, when it is non-empty.
    pub fn explicit_path(&self) -> Option<&StorePath> {
        self.root.as_ref().filter(|root| !root.is_empty())
    }

    pub fn path(&self) -> StorePath {
        match &self.root {
            Some(root) => root.concat(&self.offset),
            None => self.offset.clone(),
        }
    }

    pub fn initial_state(&self) -> &Value {
        &self.initial_state
    }

    pub fn reducers(&self) -> &ReducerTable {
        &self.reducers
    }

    pub fn duties(&self) -> &DutyTable {
        &self.duties
    }

    /// Copy of this configuration placed at `root ++ offset`.
    pub fn with_placement(&self, root: Option<StorePath>, offset: StorePath) -> StoreConfig {
        StoreConfig {
            root: root.filter(|root| !root.is_empty()),
            offset,
            ..self.clone()
        }
    }

    /// Copy of this configuration with a new root and the same offset.
    pub fn rerooted(&self, root: Option<StorePath>) -> StoreConfig {
        self.with_placement(root, self.offset.clone())
    }

    pub fn with_initial_state(&self, initial_state: Value) -> StoreConfig {
        StoreConfig {
            initial_state,
            ..self.clone()
        }
    }
}

pub struct StoreConfigBuilder {
    name: String,
    path: Option<StorePath>,
    initial_state: Value,
    reducers: ReducerTable,
    duties: DutyTable,
}

impl StoreConfigBuilder {
    /// Explicit location of the slice. Overrides the key the configuration
    /// is later discovered under.
    pub fn path(mut self, path: impl Into<StorePath>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn initial_state(mut self, state: impl Into<Value>) -> Self {
        self.initial_state = state.into();
        self
    }

    pub fn reducer<F>(mut self, name: impl Into<String>, reduce: F) -> Self
    where
        F: Fn(&Slice, &Value) -> Slice + Send + Sync + 'static,
    {
        self.reducers.insert(name.into(), Reducer::new(reduce));
        self
    }

    pub fn with_reducer(mut self, name: impl Into<String>, reducer: Reducer) -> Self {
        self.reducers.insert(name.into(), reducer);
        self
    }

    pub fn duty<F>(mut self, name: impl Into<String>, task: F) -> Self
    where
        F: Fn(Store, StoreKit, &mut Lifecycle) -> DutyCall + Send + Sync + 'static,
    {
        self.duties.insert(name.into(), Duty::new(task));
        self
    }

    pub fn with_duty(mut self, name: impl Into<String>, duty: Duty) -> Self {
        self.duties.insert(name.into(), duty);
        self
    }

    pub fn build(self) -> Result<StoreConfig, ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::MissingName);
        }

        Ok(StoreConfig {
            id: ConfigId::next(),
            name: self.name,
            root: self.path.filter(|path| !path.is_empty()),
            offset: StorePath::default(),
            initial_state: self.initial_state,
            reducers: self.reducers,
            duties: self.duties,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn counter() -> StoreConfig {
        StoreConfig::builder("counter")
            .path("counter")
            .initial_state(json!({ "value": 0 }))
            .reducer("increase_value", |state, _| {
                let value = state["value"].as_i64().unwrap_or(0);
                Arc::new(json!({ "value": value + 1 }))
            })
            .build()
            .unwrap()
    }

    #[test]
    fn builder_requires_name() {
        let err = StoreConfig::builder("").build().unwrap_err();
        assert!(matches!(err, ConfigError::MissingName));
    }

    #[test]
    fn explicit_path_is_root() {
        let config = counter();
        assert_eq!(config.name(), "counter");
        assert_eq!(config.path(), StorePath::from("counter"));
        assert!(config.reducers().contains_key("increase_value"));
    }

    #[test]
    fn placement_keeps_identity() {
        let config = counter();
        let placed = config.with_placement(Some("app".into()), StorePath::from(["nested", "counter"]));
        assert_eq!(placed.id(), config.id());
        assert_eq!(placed.path(), StorePath::from(["app", "nested", "counter"]));

        let rerooted = placed.rerooted(None);
        assert_eq!(rerooted.path(), StorePath::from(["nested", "counter"]));
    }

    #[test]
    fn empty_path_is_rootless() {
        let config = StoreConfig::builder("todos")
            .path(StorePath::default())
            .build()
            .unwrap();
        assert!(config.root().is_none());
        assert!(config.path().is_empty());
    }
}
