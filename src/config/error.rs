use thiserror::Error;

use super::path::StorePath;

/// Errors raised while building or combining store configurations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Store configuration must contain a name")]
    MissingName,

    #[error("Duplicate store name: {name}")]
    DuplicateName { name: String },

    #[error("Stores '{first}' and '{second}' share path '{path}'")]
    PathConflict {
        first: String,
        second: String,
        path: StorePath,
    },
}
