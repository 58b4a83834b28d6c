//! Parsing a configuration graph into the flat, validated set used at boot.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use super::combined::combine_stores;
use super::error::ConfigError;
use super::node::ConfigNode;
use super::path::StorePath;
use super::store::StoreConfig;
use crate::action::{ActionCreator, ActionTable};
use crate::duty::DutyTable;
use crate::reducer::ReducerTable;
use crate::store::Store;

/// Store configurations keyed by name, with resolved and distinct paths.
#[derive(Debug, Clone, Default)]
pub struct ConfigSet {
    by_name: IndexMap<String, StoreConfig>,
}

impl ConfigSet {
    /// Validate `configs` into a set.
    ///
    /// A configuration that resolves to the empty path is placed under its
    /// own name. Nested paths are allowed. Equal paths conflict, and so do
    /// paths that only differ by an index against a key of the same text.
    pub fn from_configs(
        configs: impl IntoIterator<Item = StoreConfig>,
    ) -> Result<Self, ConfigError> {
        let mut by_name: IndexMap<String, StoreConfig> = IndexMap::new();

        for config in configs {
            let config = if config.path().is_empty() {
                config.with_placement(None, StorePath::from(config.name()))
            } else {
                config
            };

            if by_name.contains_key(config.name()) {
                return Err(ConfigError::DuplicateName {
                    name: config.name().to_string(),
                });
            }

            let path = config.path();
            let conflicting = by_name.values().find(|other| {
                let other = other.path();
                other == path || other.collides_with(&path)
            });
            if let Some(existing) = conflicting {
                return Err(ConfigError::PathConflict {
                    first: existing.name().to_string(),
                    second: config.name().to_string(),
                    path,
                });
            }

            by_name.insert(config.name().to_string(), config);
        }

        Ok(Self { by_name })
    }

    pub fn get(&self, name: &str) -> Option<&StoreConfig> {
        self.by_name.get(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoreConfig> {
        self.by_name.values()
    }

    pub fn into_configs(self) -> impl Iterator<Item = StoreConfig> {
        self.by_name.into_values()
    }

    /// Replace one configuration, re-validating the whole set.
    pub fn replaced(self, config: StoreConfig) -> Result<Self, ConfigError> {
        let name = config.name().to_string();
        let mut config = Some(config);
        let configs: Vec<StoreConfig> = self
            .by_name
            .into_values()
            .filter_map(|existing| {
                if existing.name() == name {
                    config.take()
                } else {
                    Some(existing)
                }
            })
            .collect();
        ConfigSet::from_configs(configs)
    }

    pub fn reducers_by_store(&self) -> BTreeMap<String, ReducerTable> {
        self.iter()
            .map(|config| (config.name().to_string(), config.reducers().clone()))
            .collect()
    }

    pub fn duties_by_store(&self) -> BTreeMap<String, DutyTable> {
        self.iter()
            .map(|config| (config.name().to_string(), config.duties().clone()))
            .collect()
    }

    /// One action creator per reducer of every store.
    pub fn actions_by_store(&self) -> BTreeMap<String, ActionTable> {
        self.iter()
            .map(|config| {
                let actions = config
                    .reducers()
                    .keys()
                    .map(|reducer| {
                        (reducer.clone(), ActionCreator::new(config.name(), reducer.clone()))
                    })
                    .collect();
                (config.name().to_string(), actions)
            })
            .collect()
    }

    /// Store tree seeded with every configuration's initial state.
    pub fn initial_store(&self) -> Store {
        self.iter().fold(Store::new(), |store, config| {
            store.with_value(&config.path(), config.initial_state().clone())
        })
    }
}

/// Parse any configuration input into a validated [`ConfigSet`].
///
/// A combined configuration contributes its members as they are; any other
/// input is combined first, so keys become paths and explicit paths win.
pub fn parse_configs(configs: impl Into<ConfigNode>) -> Result<ConfigSet, ConfigError> {
    match configs.into() {
        ConfigNode::Combined(combined) => ConfigSet::from_configs(combined.configurations().to_vec()),
        other => {
            let combined = combine_stores(other, None)?;
            ConfigSet::from_configs(combined.configurations().to_vec())
        }
    }
}
