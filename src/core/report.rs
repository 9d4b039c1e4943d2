//! Run report - the final result of a pipeline run

use crate::core::{
    error::StageFailure,
    stage::StageId,
    state::PipelineState,
    status::{ExecutionStatus, StageState},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Merged state of a run plus every failure it produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub status: ExecutionStatus,
    pub state: PipelineState,

    /// One entry per failed stage, in execution order
    pub errors: Vec<StageFailure>,

    pub stages: BTreeMap<StageId, StageState>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl RunReport {
    pub fn video_url(&self) -> &str {
        &self.state.video_url
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Completed && self.errors.is_empty()
    }

    /// Error attached for a stage, if it failed
    pub fn error_for(&self, stage: StageId) -> Option<&StageFailure> {
        self.errors.iter().find(|failure| failure.stage == stage)
    }

    pub fn stage_state(&self, stage: StageId) -> Option<&StageState> {
        self.stages.get(&stage)
    }

    /// Stages that were never attempted because of an upstream failure
    pub fn skipped(&self) -> Vec<StageId> {
        self.stages
            .iter()
            .filter(|(_, state)| matches!(state, StageState::Skipped { .. }))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn duration(&self) -> std::time::Duration {
        self.completed_at
            .signed_duration_since(self.started_at)
            .to_std()
            .unwrap_or_default()
    }
}
