//! Immutable nested store tree.
//!
//! Every update produces a new tree that shares all unchanged branches and
//! slices with the previous one, so identity comparison (`ptr_eq`) is enough
//! to tell whether anything changed.
//!
//! A node may carry a slice and child branches at once: a store mounted at
//! `app` and a sub-store at `app.child` live side by side, and the sub-store
//! shows up under the `child` key when the tree is rendered as JSON.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::{Segment, StorePath};

/// The state of one store, shared by reference between snapshots.
pub type Slice = Arc<Value>;

#[derive(Clone, Default)]
struct Node {
    slice: Option<Slice>,
    children: BTreeMap<Segment, Arc<Node>>,
}

/// Snapshot of the whole application state.
#[derive(Clone, Default)]
pub struct Store {
    root: Arc<Node>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slice stored exactly at `path`.
    pub fn get(&self, path: &StorePath) -> Option<&Slice> {
        if path.is_empty() {
            return None;
        }
        let mut node: &Node = &self.root;
        for segment in path.segments() {
            node = node.children.get(segment)?.as_ref();
        }
        node.slice.as_ref()
    }

    pub fn contains(&self, path: &StorePath) -> bool {
        self.get(path).is_some()
    }

    /// New tree with `slice` stored at `path`.
    ///
    /// Only the nodes along `path` are copied; slices stored below `path`
    /// are kept.
    pub fn with_slice(&self, path: &StorePath, slice: Slice) -> Store {
        if path.is_empty() {
            tracing::warn!("Ignoring write to the empty store path");
            return self.clone();
        }
        Store {
            root: Arc::new(insert(&self.root, path.segments(), slice)),
        }
    }

    pub fn with_value(&self, path: &StorePath, value: Value) -> Store {
        self.with_slice(path, Arc::new(value))
    }

    pub fn ptr_eq(&self, other: &Store) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root.slice.is_none() && self.root.children.is_empty()
    }

    /// Render the tree as JSON; index segments become object keys.
    ///
    /// Child branches are merged into an object slice stored at the same
    /// node and take precedence over its keys. Sibling segments `Index(n)`
    /// and `Key("n")` render to the same key, the key segment winning;
    /// [`ConfigSet`](crate::config::ConfigSet) rejects such store paths.
    pub fn to_value(&self) -> Value {
        if self.is_empty() {
            return Value::Object(Map::new());
        }
        node_to_value(&self.root)
    }
}

fn insert(node: &Node, path: &[Segment], slice: Slice) -> Node {
    let mut next = node.clone();
    match path {
        [] => next.slice = Some(slice),
        [head, rest @ ..] => {
            let child = match node.children.get(head) {
                Some(child) => insert(child, rest, slice),
                None => insert(&Node::default(), rest, slice),
            };
            next.children.insert(head.clone(), Arc::new(child));
        }
    }
    next
}

fn node_to_value(node: &Node) -> Value {
    if node.children.is_empty() {
        return node
            .slice
            .as_ref()
            .map(|slice| slice.as_ref().clone())
            .unwrap_or(Value::Null);
    }

    let mut map = match node.slice.as_deref() {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };
    for (segment, child) in &node.children {
        map.insert(segment.to_string(), node_to_value(child));
    }
    Value::Object(map)
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Store").field(&self.to_value()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn write_then_read() {
        let path = StorePath::from(["app", "counter"]);
        let store = Store::new().with_value(&path, json!({ "value": 1 }));
        assert_eq!(**store.get(&path).unwrap(), json!({ "value": 1 }));
        assert!(store.get(&StorePath::from("app")).is_none());
        assert!(store.get(&StorePath::from(["app", "counter", "value"])).is_none());
    }

    #[test]
    fn unchanged_slices_are_shared() {
        let a = StorePath::from(["app", "a"]);
        let b = StorePath::from(["other", "b"]);
        let store = Store::new()
            .with_value(&a, json!(1))
            .with_value(&b, json!(2));
        let next = store.with_value(&a, json!(10));

        assert!(!next.ptr_eq(&store));
        assert!(Arc::ptr_eq(store.get(&b).unwrap(), next.get(&b).unwrap()));
        assert_eq!(**store.get(&a).unwrap(), json!(1));
        assert_eq!(**next.get(&a).unwrap(), json!(10));
    }

    #[test]
    fn empty_path_write_is_ignored() {
        let store = Store::new().with_value(&StorePath::from("x"), json!(true));
        let next = store.with_value(&StorePath::default(), json!(false));
        assert!(next.ptr_eq(&store));
    }

    #[test]
    fn nested_slices_coexist() {
        let parent = StorePath::from("app");
        let child = StorePath::from(["app", "child"]);
        let store = Store::new()
            .with_value(&parent, json!({ "title": "x" }))
            .with_value(&child, json!({ "value": 0 }));
        let next = store.with_value(&parent, json!({ "title": "y" }));

        assert!(Arc::ptr_eq(store.get(&child).unwrap(), next.get(&child).unwrap()));
        assert_eq!(
            next.to_value(),
            json!({ "app": { "title": "y", "child": { "value": 0 } } })
        );
    }

    #[test]
    fn key_sibling_wins_over_index_of_same_text() {
        let by_index: StorePath = vec![Segment::from("rows"), Segment::from(0usize)].into();
        let store = Store::new()
            .with_value(&StorePath::from(["rows", "0"]), json!("key"))
            .with_value(&by_index, json!("index"));

        assert_eq!(store.get(&by_index).map(|s| s.as_ref().clone()), Some(json!("index")));
        assert_eq!(store.to_value(), json!({ "rows": { "0": "key" } }));
    }

    #[test]
    fn to_value_nests_branches() {
        let store = Store::new()
            .with_value(&StorePath::from(["app", "counter"]), json!({ "value": 0 }))
            .with_value(&StorePath::from("flag"), json!(true));
        assert_eq!(
            store.to_value(),
            json!({ "app": { "counter": { "value": 0 } }, "flag": true })
        );
    }
}
