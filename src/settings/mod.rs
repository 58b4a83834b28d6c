//! Optional TOML settings: engine limits and per-store overrides.

mod loader;
mod types;

pub use loader::SettingsError;
pub use types::{EngineSettings, Settings, StoreOverride};

use crate::config::{ConfigError, ConfigSet, StorePath};

impl Settings {
    /// Apply the store overrides to `configs`.
    ///
    /// A path override relocates the store; an initial-state override seeds
    /// it. Overrides naming unknown stores are ignored.
    ///
    /// # Errors
    /// `PathConflict` when a relocated store lands on another store's path.
    pub fn apply(&self, configs: ConfigSet) -> Result<ConfigSet, ConfigError> {
        let mut configs = configs;
        for (name, store) in &self.stores {
            let Some(config) = configs.get(name) else {
                tracing::warn!(store = %name, "Settings override names an unknown store");
                continue;
            };

            let mut config = config.clone();
            if let Some(path) = &store.path {
                config = config.with_placement(Some(path.clone()), StorePath::default());
            }
            if let Some(initial_state) = &store.initial_state {
                config = config.with_initial_state(initial_state.clone());
            }

            tracing::debug!(store = %name, path = %config.path(), "Store override applied");
            configs = configs.replaced(config)?;
        }
        Ok(configs)
    }
}
