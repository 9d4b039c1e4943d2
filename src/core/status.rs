//! Execution state models

use crate::core::{error::StageError, state::Field};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Overall run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Every stage completed
    Completed,
    /// At least one stage failed; the state holds whatever was produced
    Failed,
}

/// State of a single stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageState {
    /// Waiting for its inputs
    Pending,
    /// Currently running
    Running { started_at: DateTime<Utc> },
    /// Completed and merged its outputs
    Completed {
        fields: Vec<Field>,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    /// Failed; the error is also attached to the run report
    Failed {
        error: StageError,
        started_at: DateTime<Utc>,
        failed_at: DateTime<Utc>,
    },
    /// Never attempted because an upstream stage failed
    Skipped { reason: String },
}
