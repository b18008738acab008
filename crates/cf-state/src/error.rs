//! State errors

use cf_core::ChartError;

use crate::SCORE_VERSION;

/// Errors raised by persistence and clipboard handling
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Chart(#[from] ChartError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Score version {0} is newer than supported (max: {SCORE_VERSION})")]
    FutureVersion(u32),
}

pub type StateResult<T> = Result<T, StateError>;
