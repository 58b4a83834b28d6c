use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::StorePath;

/// Root settings container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub engine: EngineSettings,
    /// Per-store overrides keyed by store name.
    #[serde(default)]
    pub stores: BTreeMap<String, StoreOverride>,
}

/// Dispatch engine limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Commit cycles one dispatch may trigger before it is treated as a
    /// loop (default: 100).
    #[serde(default = "default_max_update_cycles")]
    pub max_update_cycles: u32,
}

/// Replacement path or initial state for one store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreOverride {
    #[serde(default)]
    pub path: Option<StorePath>,
    #[serde(default)]
    pub initial_state: Option<Value>,
}

fn default_max_update_cycles() -> u32 {
    100
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_update_cycles: default_max_update_cycles(),
        }
    }
}
