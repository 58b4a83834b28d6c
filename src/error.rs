use thiserror::Error;
use uuid::Uuid;

use crate::config::ConfigError;
use crate::engine::DispatchError;
use crate::settings::SettingsError;

/// Errors surfaced by the registry, the hooks and the duty runner.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Root of registry {registry} is already configured")]
    DuplicateRegistration { registry: Uuid },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("{hook} called outside of a controller render")]
    MissingContext { hook: &'static str },

    #[error("Duty '{duty}' not found in {scope}")]
    UnknownDuty { scope: String, duty: String },

    #[error("Selector already registered for controller '{controller}' under '{key}'")]
    DuplicateSelector { controller: String, key: String },

    #[error("Controller '{name}' is already mounted")]
    DuplicateController { name: String },

    #[error("Controller '{name}' provides a value of another type than {expected}")]
    ControllerValueType { name: String, expected: &'static str },
}
