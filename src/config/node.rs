//! Configuration graph accepted by combination and boot.

use super::combined::CombinedConfig;
use super::path::Segment;
use super::store::StoreConfig;

/// One node of a configuration graph.
#[derive(Debug, Clone)]
pub enum ConfigNode {
    /// A single store configuration.
    Store(StoreConfig),
    /// The result of an earlier combination; never traversed again.
    Combined(CombinedConfig),
    /// A keyed (or index-keyed) group of further nodes, in declaration order.
    Branch(Vec<(Segment, ConfigNode)>),
}

impl ConfigNode {
    pub fn branch<K, N, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, N)>,
        K: Into<Segment>,
        N: Into<ConfigNode>,
    {
        ConfigNode::Branch(
            entries
                .into_iter()
                .map(|(key, node)| (key.into(), node.into()))
                .collect(),
        )
    }

    /// Branch keyed by position, the equivalent of an array of configurations.
    pub fn list<N, I>(items: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<ConfigNode>,
    {
        ConfigNode::Branch(
            items
                .into_iter()
                .enumerate()
                .map(|(index, node)| (Segment::Index(index), node.into()))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ConfigNode::Branch(entries) if entries.is_empty())
    }
}

impl From<StoreConfig> for ConfigNode {
    fn from(config: StoreConfig) -> Self {
        ConfigNode::Store(config)
    }
}

impl From<CombinedConfig> for ConfigNode {
    fn from(combined: CombinedConfig) -> Self {
        ConfigNode::Combined(combined)
    }
}

impl From<Vec<StoreConfig>> for ConfigNode {
    fn from(configs: Vec<StoreConfig>) -> Self {
        ConfigNode::list(configs)
    }
}
