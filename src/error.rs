use thiserror::Error;

/// Errors produced by the environment and the agent
#[derive(Error, Debug)]
pub enum Error {
    /// The grid configuration violates one of its invariants
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// `step` was called before the first `reset`
    #[error("Environment not initialized. Call reset() first.")]
    NotReset,

    /// An action index outside the discrete action set
    #[error("Invalid action: {0}. Must be 0-3.")]
    InvalidAction(usize),

    /// A restored table does not match the live agent's dimensions
    ///
    /// Dimensions are `(states, actions)`
    #[error("Q-table dimension mismatch: expected {expected:?}, found {found:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
