use thiserror::Error;

/// Errors raised while dispatching actions.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Malformed action: {reason}")]
    MalformedAction { reason: String },

    #[error("Chain actions must be an array, got {found}")]
    MalformedChain { found: &'static str },

    #[error("Store updates did not settle after {cycles} update cycles")]
    UpdateLoop { cycles: u32 },
}
