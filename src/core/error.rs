//! Stage error taxonomy

use crate::core::{stage::StageId, state::Field};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stage update targeted a field it may not write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("field `{0}` is already populated")]
pub struct StateConflict(pub Field);

/// Why a stage failed
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum StageError {
    /// A structured value was requested and the response did not conform
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// Free-text generation failed
    #[error("generation failed: {0}")]
    Generation(String),

    #[error("transcript unavailable: {0}")]
    TranscriptUnavailable(String),

    #[error("video search unavailable: {0}")]
    SearchUnavailable(String),

    /// The call exceeded its deadline, in milliseconds
    #[error("timed out after {0}ms")]
    Timeout(u64),

    /// The stage broke its contract: an input was missing or an output was undeclared
    #[error("state conflict: {0}")]
    StateConflict(String),
}

impl From<StateConflict> for StageError {
    fn from(conflict: StateConflict) -> Self {
        StageError::StateConflict(conflict.to_string())
    }
}

/// A failure attached to the run result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFailure {
    pub stage: StageId,
    pub error: StageError,
}

impl std::fmt::Display for StageFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.stage, self.error)
    }
}
