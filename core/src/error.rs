use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid plan catalog: {reason}")]
    InvalidCatalog { reason: String },

    #[error("Invalid visit rate for segment '{segment}': {rate}")]
    InvalidRate { segment: String, rate: f64 },

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Engine phase violation: expected {expected}, got {actual}")]
    PhaseViolation {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Run not initialized")]
    RunNotInitialized,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimError {
    pub fn catalog(reason: impl Into<String>) -> Self {
        Self::InvalidCatalog {
            reason: reason.into(),
        }
    }

    pub fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// True for errors raised while validating configuration,
    /// before any user has been simulated.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCatalog { .. } | Self::InvalidRate { .. } | Self::InvalidParameter { .. }
        )
    }
}

pub type SimResult<T> = Result<T, SimError>;
