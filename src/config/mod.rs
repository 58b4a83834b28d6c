//! Store configurations and their composition into one addressable set.

mod combined;
mod error;
mod node;
mod parse;
mod path;
mod store;

pub use combined::{combine_stores, CombinedConfig};
pub use error::ConfigError;
pub use node::ConfigNode;
pub use parse::{parse_configs, ConfigSet};
pub use path::{merge_path, traverse, Segment, StorePath, TraversedEntry, TraversedPaths};
pub use store::{ConfigId, StoreConfig, StoreConfigBuilder};
