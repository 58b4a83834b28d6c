//! Actions, action creators and chained transactions.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::DispatchError;
use crate::store::Store;

/// Request to run reducer `name` of store `store_name` with `payload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub store_name: String,
    pub name: String,
    #[serde(default)]
    pub payload: Value,
}

impl Action {
    pub fn new(store_name: impl Into<String>, name: impl Into<String>, payload: impl Into<Value>) -> Self {
        Self {
            store_name: store_name.into(),
            name: name.into(),
            payload: payload.into(),
        }
    }
}

/// Builds actions for one reducer of one store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCreator {
    store_name: String,
    name: String,
}

/// Action creators of one store, keyed by reducer name.
pub type ActionTable = BTreeMap<String, ActionCreator>;

impl ActionCreator {
    pub fn new(store_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            store_name: store_name.into(),
            name: name.into(),
        }
    }

    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn create(&self, payload: impl Into<Value>) -> Action {
        Action::new(self.store_name.clone(), self.name.clone(), payload)
    }

    /// Action without payload.
    pub fn empty(&self) -> Action {
        self.create(Value::Null)
    }
}

type DeriveFn = dyn Fn(&Store) -> Option<Action> + Send + Sync;

/// One step of a chained transaction.
#[derive(Clone)]
pub enum ChainStep {
    Action(Action),
    /// Computed from the store as left by the previous steps; `None` skips.
    Derived(Arc<DeriveFn>),
}

impl ChainStep {
    pub fn derived<F>(derive: F) -> Self
    where
        F: Fn(&Store) -> Option<Action> + Send + Sync + 'static,
    {
        ChainStep::Derived(Arc::new(derive))
    }

    pub fn resolve(&self, store: &Store) -> Option<Action> {
        match self {
            ChainStep::Action(action) => Some(action.clone()),
            ChainStep::Derived(derive) => derive(store),
        }
    }
}

impl fmt::Debug for ChainStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainStep::Action(action) => f.debug_tuple("Action").field(action).finish(),
            ChainStep::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

impl From<Action> for ChainStep {
    fn from(action: Action) -> Self {
        ChainStep::Action(action)
    }
}

/// Ordered actions applied as one transaction, each seeing the previous
/// step's result.
#[derive(Debug, Clone, Default)]
pub struct Chain {
    steps: Vec<ChainStep>,
}

impl Chain {
    pub fn new(steps: impl IntoIterator<Item = ChainStep>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
        }
    }

    /// Parse a JSON array of actions.
    pub fn from_value(value: Value) -> Result<Self, DispatchError> {
        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(DispatchError::MalformedChain {
                    found: json_kind(&other),
                })
            }
        };

        items
            .into_iter()
            .map(|item| parse_action(item).map(ChainStep::Action))
            .collect::<Result<Vec<_>, _>>()
            .map(|steps| Self { steps })
    }

    pub fn then(mut self, action: Action) -> Self {
        self.steps.push(ChainStep::Action(action));
        self
    }

    pub fn then_with<F>(mut self, derive: F) -> Self
    where
        F: Fn(&Store) -> Option<Action> + Send + Sync + 'static,
    {
        self.steps.push(ChainStep::derived(derive));
        self
    }

    pub fn steps(&self) -> &[ChainStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Anything `dispatch` accepts.
#[derive(Debug, Clone)]
pub enum Dispatchable {
    Single(Action),
    Chain(Chain),
}

impl Dispatchable {
    /// Parse a JSON action object or an array of action objects.
    pub fn from_value(value: Value) -> Result<Self, DispatchError> {
        match value {
            Value::Array(_) => Chain::from_value(value).map(Dispatchable::Chain),
            Value::Object(_) => parse_action(value).map(Dispatchable::Single),
            other => Err(DispatchError::MalformedAction {
                reason: format!("an action must be an object or an array, got {}", json_kind(&other)),
            }),
        }
    }
}

impl From<Action> for Dispatchable {
    fn from(action: Action) -> Self {
        Dispatchable::Single(action)
    }
}

impl From<Chain> for Dispatchable {
    fn from(chain: Chain) -> Self {
        Dispatchable::Chain(chain)
    }
}

impl From<Vec<Action>> for Dispatchable {
    fn from(actions: Vec<Action>) -> Self {
        Dispatchable::Chain(Chain::new(actions.into_iter().map(ChainStep::Action)))
    }
}

impl From<Vec<ChainStep>> for Dispatchable {
    fn from(steps: Vec<ChainStep>) -> Self {
        Dispatchable::Chain(Chain::new(steps))
    }
}

fn parse_action(value: Value) -> Result<Action, DispatchError> {
    if !value.is_object() {
        return Err(DispatchError::MalformedAction {
            reason: format!("expected an action object, got {}", json_kind(&value)),
        });
    }
    serde_json::from_value(value).map_err(|e| DispatchError::MalformedAction {
        reason: e.to_string(),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
