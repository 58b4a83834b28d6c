//! Path resolution for store configurations.
//!
//! A path is an ordered list of segments locating a slice inside the nested
//! store tree. Resolution walks a configuration graph depth-first and records,
//! for every store configuration reachable from it, the path relative to the
//! point where the walk started.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::combined::CombinedConfig;
use super::node::ConfigNode;
use super::store::{ConfigId, StoreConfig};

/// One step in a store path: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    Index(usize),
    Key(String),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Index(index) => write!(f, "{}", index),
            Segment::Key(key) => f.write_str(key),
        }
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<String> for Segment {
    fn from(key: String) -> Self {
        Segment::Key(key)
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

/// Ordered sequence of segments addressing a slice in the store tree.
///
/// An empty path addresses nothing; configurations that resolve to an empty
/// path are placed under their own name when the configuration set is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorePath(Vec<Segment>);

impl StorePath {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn first(&self) -> Option<&Segment> {
        self.0.first()
    }

    /// Whether both paths render to the same JSON location although they
    /// differ, as `[0]` and `["0"]` do.
    pub fn collides_with(&self, other: &StorePath) -> bool {
        let common = self.0.len().min(other.0.len());
        match (0..common).find(|&i| self.0[i] != other.0[i]) {
            Some(i) => self.0[i].to_string() == other.0[i].to_string(),
            None => false,
        }
    }

    /// `[...self, ...other]`.
    pub fn concat(&self, other: &StorePath) -> StorePath {
        let mut segments = Vec::with_capacity(self.0.len() + other.0.len());
        segments.extend_from_slice(&self.0);
        segments.extend_from_slice(&other.0);
        StorePath(segments)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl From<Segment> for StorePath {
    fn from(segment: Segment) -> Self {
        StorePath(vec![segment])
    }
}

impl From<&str> for StorePath {
    fn from(key: &str) -> Self {
        StorePath(vec![Segment::from(key)])
    }
}

impl From<String> for StorePath {
    fn from(key: String) -> Self {
        StorePath(vec![Segment::from(key)])
    }
}

impl From<usize> for StorePath {
    fn from(index: usize) -> Self {
        StorePath(vec![Segment::from(index)])
    }
}

impl From<Vec<Segment>> for StorePath {
    fn from(segments: Vec<Segment>) -> Self {
        StorePath(segments)
    }
}

impl From<&[&str]> for StorePath {
    fn from(keys: &[&str]) -> Self {
        keys.iter().copied().map(Segment::from).collect()
    }
}

impl<const N: usize> From<[&str; N]> for StorePath {
    fn from(keys: [&str; N]) -> Self {
        keys.into_iter().map(Segment::from).collect()
    }
}

impl FromIterator<Segment> for StorePath {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        StorePath(iter.into_iter().collect())
    }
}

/// A configuration discovered during traversal and the path it was found at.
#[derive(Debug, Clone)]
pub struct TraversedEntry {
    pub config: StoreConfig,
    pub path: StorePath,
}

/// Insertion-ordered mapping from configuration identity to its relative path.
///
/// Re-inserting a configuration that is already present keeps its original
/// position and replaces the path.
#[derive(Debug, Clone, Default)]
pub struct TraversedPaths {
    entries: IndexMap<ConfigId, TraversedEntry>,
}

impl TraversedPaths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, config: StoreConfig, path: StorePath) {
        self.entries
            .insert(config.id(), TraversedEntry { config, path });
    }

    /// Disjoint union; entries from `other` win on identity clashes.
    pub fn extend(&mut self, other: TraversedPaths) {
        for (id, entry) in other.entries {
            self.entries.insert(id, entry);
        }
    }

    /// Prefix every recorded path with `root`.
    pub fn prefixed(self, root: &StorePath) -> TraversedPaths {
        let entries = self
            .entries
            .into_iter()
            .map(|(id, entry)| {
                let path = root.concat(&entry.path);
                (id, TraversedEntry { path, ..entry })
            })
            .collect();
        TraversedPaths { entries }
    }

    pub fn get(&self, config: &StoreConfig) -> Option<&StorePath> {
        self.entries.get(&config.id()).map(|entry| &entry.path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TraversedEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve every store configuration reachable from `node`.
///
/// - a store configuration at the top level is recorded at its explicit path,
///   or at the empty path when it has none
/// - a combined configuration is not traversed again; its recorded paths are
///   reused as they are, prefixed with its root when it has one
/// - a branch is walked entry by entry (see [`traverse_entry`])
pub fn traverse(node: &ConfigNode) -> TraversedPaths {
    match node {
        ConfigNode::Store(config) => {
            let mut paths = TraversedPaths::new();
            paths.insert(config.clone(), config.explicit_path().cloned().unwrap_or_default());
            paths
        }
        ConfigNode::Combined(combined) => combined_paths(combined, None),
        ConfigNode::Branch(entries) => {
            let mut paths = TraversedPaths::new();
            for (key, child) in entries {
                paths.extend(traverse_entry(key, child));
            }
            paths
        }
    }
}

/// Resolve one entry of a branch found under `key`.
fn traverse_entry(key: &Segment, node: &ConfigNode) -> TraversedPaths {
    match node {
        ConfigNode::Store(config) => {
            let path = config
                .explicit_path()
                .cloned()
                .unwrap_or_else(|| StorePath::from(key.clone()));
            let mut paths = TraversedPaths::new();
            paths.insert(config.clone(), path);
            paths
        }
        ConfigNode::Combined(combined) => combined_paths(combined, Some(key)),
        ConfigNode::Branch(_) => merge_path(key.clone(), traverse(node)),
    }
}

fn combined_paths(combined: &CombinedConfig, key: Option<&Segment>) -> TraversedPaths {
    let paths = combined.traversed_paths().clone();
    match (combined.root(), key) {
        (Some(root), _) => paths.prefixed(root),
        (None, Some(key)) => merge_path(key.clone(), paths),
        (None, None) => paths,
    }
}

/// Merge a root segment (or path) in front of every path in `paths`.
pub fn merge_path(root: impl Into<StorePath>, paths: TraversedPaths) -> TraversedPaths {
    paths.prefixed(&root.into())
}
