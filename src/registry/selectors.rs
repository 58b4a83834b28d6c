//! Per-controller selector bookkeeping.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::config::StorePath;
use crate::error::CoreError;
use crate::store::{Slice, Store};

/// What a selector projected out of the store.
///
/// Direct selections are compared by identity when deciding whether a
/// controller re-renders; shallow ones structurally.
#[derive(Debug, Clone)]
pub enum Selection {
    Direct(Slice),
    Shallow(Slice),
}

impl Selection {
    pub fn slice(&self) -> &Slice {
        match self {
            Selection::Direct(slice) | Selection::Shallow(slice) => slice,
        }
    }

    pub fn into_slice(self) -> Slice {
        match self {
            Selection::Direct(slice) | Selection::Shallow(slice) => slice,
        }
    }

    pub fn is_shallow(&self) -> bool {
        matches!(self, Selection::Shallow(_))
    }
}

type SelectFn = dyn Fn(&Store) -> Selection + Send + Sync;

/// Projection of the store a controller depends on.
#[derive(Clone)]
pub struct Selector(Arc<SelectFn>);

impl Selector {
    pub fn new<F>(select: F) -> Self
    where
        F: Fn(&Store) -> Selection + Send + Sync + 'static,
    {
        Selector(Arc::new(select))
    }

    /// The slice stored at `path`, `null` when absent.
    pub fn at(path: impl Into<StorePath>) -> Self {
        let path = path.into();
        Selector::new(move |store| Selection::Direct(slice_at(store, &path)))
    }

    /// Like [`Selector::at`], compared structurally.
    pub fn shallow_at(path: impl Into<StorePath>) -> Self {
        let path = path.into();
        Selector::new(move |store| Selection::Shallow(slice_at(store, &path)))
    }

    /// A value derived from the store, compared structurally.
    pub fn derived<F>(derive: F) -> Self
    where
        F: Fn(&Store) -> Value + Send + Sync + 'static,
    {
        Selector::new(move |store| Selection::Shallow(Arc::new(derive(store))))
    }

    pub fn select(&self, store: &Store) -> Selection {
        (self.0)(store)
    }

    pub fn ptr_eq(&self, other: &Selector) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Selector(..)")
    }
}

fn slice_at(store: &Store, path: &StorePath) -> Slice {
    store
        .get(path)
        .cloned()
        .unwrap_or_else(|| Arc::new(Value::Null))
}

/// Selectors of every mounted controller, keyed `"{controller}-selector{n}"`.
#[derive(Debug, Default)]
pub(super) struct SelectorTable {
    by_controller: HashMap<String, IndexMap<String, Selector>>,
    // Survives emptied entries so keys are never reused by a live controller.
    counters: HashMap<String, u64>,
}

impl SelectorTable {
    pub(super) fn assign(&mut self, controller: &str, selector: Selector) -> Result<String, CoreError> {
        if let Some(selectors) = self.by_controller.get(controller) {
            if let Some((key, _)) = selectors.iter().find(|(_, existing)| existing.ptr_eq(&selector)) {
                return Err(CoreError::DuplicateSelector {
                    controller: controller.to_string(),
                    key: key.clone(),
                });
            }
        }

        let counter = self.counters.entry(controller.to_string()).or_default();
        let key = format!("{}-selector{}", controller, counter);
        *counter += 1;

        self.by_controller
            .entry(controller.to_string())
            .or_default()
            .insert(key.clone(), selector);
        Ok(key)
    }

    pub(super) fn remove(&mut self, controller: &str, key: &str) -> bool {
        let Some(selectors) = self.by_controller.get_mut(controller) else {
            return false;
        };
        let removed = selectors.shift_remove(key).is_some();
        if selectors.is_empty() {
            self.by_controller.remove(controller);
        }
        removed
    }

    pub(super) fn remove_controller(&mut self, controller: &str) -> usize {
        self.counters.remove(controller);
        self.by_controller
            .remove(controller)
            .map(|selectors| selectors.len())
            .unwrap_or(0)
    }

    pub(super) fn get(&self, controller: &str) -> IndexMap<String, Selector> {
        self.by_controller.get(controller).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_grow_per_controller() {
        let mut table = SelectorTable::default();
        let first = table.assign("controller-a1", Selector::at("a")).unwrap();
        let second = table.assign("controller-a1", Selector::at("b")).unwrap();
        let other = table.assign("controller-b2", Selector::at("a")).unwrap();
        assert_eq!(first, "controller-a1-selector0");
        assert_eq!(second, "controller-a1-selector1");
        assert_eq!(other, "controller-b2-selector0");

        assert!(table.remove("controller-a1", &second));
        let third = table.assign("controller-a1", Selector::at("c")).unwrap();
        assert_eq!(third, "controller-a1-selector2");
    }

    #[test]
    fn same_selector_twice_is_rejected() {
        let mut table = SelectorTable::default();
        let selector = Selector::at("a");
        table.assign("c", selector.clone()).unwrap();
        let err = table.assign("c", selector).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateSelector { ref key, .. } if key == "c-selector0"));
    }

    #[test]
    fn removal_is_idempotent() {
        let mut table = SelectorTable::default();
        let key = table.assign("c", Selector::at("a")).unwrap();
        assert!(table.remove("c", &key));
        assert!(!table.remove("c", &key));
        assert!(!table.remove("unknown", &key));
        assert!(table.get("c").is_empty());
        assert_eq!(table.remove_controller("c"), 0);
    }

    #[test]
    fn derived_selection_is_shallow() {
        let store = Store::new().with_value(&StorePath::from("a"), json!({ "n": 2 }));
        let selection = Selector::derived(|store| {
            let n = store.get(&StorePath::from("a")).map(|s| s["n"].clone());
            json!({ "double": n.and_then(|n| n.as_i64()).unwrap_or(0) * 2 })
        })
        .select(&store);
        assert!(selection.is_shallow());
        assert_eq!(**selection.slice(), json!({ "double": 4 }));
        assert!(Selector::at("missing").select(&store).slice().is_null());
    }
}
