/// Error types for the replenishment policy engine
/// Raised while validating inputs; solver inner loops are total once inputs pass

use thiserror::Error;

/// Result alias used across the crate
pub type PolicyResult<T> = Result<T, PolicyError>;

#[derive(Debug, Error)]
pub enum PolicyError {
    /// Invalid problem parameter (horizon, capacity, prices, initial state...)
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Demand mass that cannot be used as a probability distribution
    #[error("degenerate demand distribution: {0}")]
    DegeneratePmf(String),

    /// The relaxation needs one marginal PMF per product
    #[error("per-product demand distributions have not been set")]
    MissingProductPmfs,

    #[error("period {period} outside horizon 1..={horizon}")]
    PeriodOutOfRange { period: u32, horizon: u32 },

    /// Gamma parameters or demand weights that cannot form a distribution
    #[error("demand distribution error: {0}")]
    Distribution(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PolicyError {
    pub fn config(message: impl Into<String>) -> Self {
        PolicyError::Config(message.into())
    }

    pub fn degenerate(message: impl Into<String>) -> Self {
        PolicyError::DegeneratePmf(message.into())
    }
}
