use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid office configuration: {reason}")]
    Validation { reason: String },

    #[error("Invariant violation: {reason}")]
    InvariantViolation { reason: String },

    #[error("Event flush did not settle after {cycles} cycles")]
    FlushOverrun { cycles: usize },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation { reason: reason.into() }
    }

    pub fn invariant(reason: impl Into<String>) -> Self {
        Self::InvariantViolation { reason: reason.into() }
    }
}

pub type SimResult<T> = Result<T, SimError>;
