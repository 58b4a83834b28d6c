//! Composition of independently defined store configurations.

use std::collections::HashSet;

use indexmap::IndexMap;

use super::error::ConfigError;
use super::node::ConfigNode;
use super::path::{traverse, StorePath, TraversedPaths};
use super::store::StoreConfig;

/// A set of store configurations merged into one addressable namespace.
///
/// Built once by [`combine_stores`] and never mutated; [`reset_root`]
/// produces a new combination instead.
///
/// [`reset_root`]: CombinedConfig::reset_root
#[derive(Debug, Clone)]
pub struct CombinedConfig {
    root: Option<StorePath>,
    traversed: TraversedPaths,
    configurations: Vec<StoreConfig>,
}

impl CombinedConfig {
    /// Shared prefix applied to every configuration, if any.
    pub fn root(&self) -> Option<&StorePath> {
        self.root.as_ref()
    }

    /// Paths relative to the combination point, before any root is applied.
    pub fn traversed_paths(&self) -> &TraversedPaths {
        &self.traversed
    }

    pub fn configurations(&self) -> &[StoreConfig] {
        &self.configurations
    }

    pub fn config_by_name(&self) -> IndexMap<&str, &StoreConfig> {
        self.configurations
            .iter()
            .map(|config| (config.name(), config))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&StoreConfig> {
        self.configurations.iter().find(|config| config.name() == name)
    }

    /// Re-home every contained configuration under `new_root`.
    ///
    /// An empty path makes the combination rootless.
    pub fn reset_root(&self, new_root: impl Into<StorePath>) -> CombinedConfig {
        let root = Some(new_root.into()).filter(|root| !root.is_empty());
        let configurations = self
            .configurations
            .iter()
            .map(|config| config.rerooted(root.clone()))
            .collect();

        CombinedConfig {
            root,
            traversed: self.traversed.clone(),
            configurations,
        }
    }
}

/// Merge `main` and optional `sub_stores` into one combined configuration.
///
/// A single store passed as `main` sits at the root of the combination and
/// its explicit path, if any, becomes the shared root of every member,
/// sub-stores included. Sub-store paths are recorded relative to the
/// combination point.
pub fn combine_stores(
    main: impl Into<ConfigNode>,
    sub_stores: Option<ConfigNode>,
) -> Result<CombinedConfig, ConfigError> {
    let main = main.into();
    let mut root = None;
    let mut traversed = TraversedPaths::new();

    match &main {
        ConfigNode::Store(config) => {
            root = config.explicit_path().cloned();
            traversed.insert(config.clone(), StorePath::default());
        }
        other => traversed.extend(traverse(other)),
    }

    if let Some(sub_stores) = sub_stores.filter(|node| !node.is_empty()) {
        traversed.extend(traverse(&sub_stores));
    }

    let configurations: Vec<StoreConfig> = traversed
        .iter()
        .map(|entry| entry.config.with_placement(root.clone(), entry.path.clone()))
        .collect();

    let mut names = HashSet::new();
    for config in &configurations {
        if !names.insert(config.name()) {
            return Err(ConfigError::DuplicateName {
                name: config.name().to_string(),
            });
        }
    }

    tracing::debug!(
        stores = configurations.len(),
        root = %root.as_ref().map(ToString::to_string).unwrap_or_default(),
        "Combined store configurations"
    );

    Ok(CombinedConfig {
        root,
        traversed,
        configurations,
    })
}
