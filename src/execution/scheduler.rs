//! Execution scheduler - determines which stages to start next

use crate::core::{
    config::{ExecutionSettings, StrategySetting},
    graph::StageGraph,
    stage::StageId,
    state::PipelineState,
    status::StageState,
};
use std::collections::BTreeMap;

/// Strategy for scheduling stage execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulingStrategy {
    /// Execute stages in dependency order, one at a time
    Sequential,

    /// Start every ready stage immediately
    #[default]
    Parallel,

    /// Limited parallelism (max N concurrent stages)
    LimitedParallel(usize),
}

impl From<&ExecutionSettings> for SchedulingStrategy {
    fn from(settings: &ExecutionSettings) -> Self {
        match settings.strategy {
            StrategySetting::Sequential => SchedulingStrategy::Sequential,
            StrategySetting::Parallel => SchedulingStrategy::Parallel,
            StrategySetting::Limited => {
                SchedulingStrategy::LimitedParallel(settings.max_concurrency)
            }
        }
    }
}

/// Scheduler for determining which stages to run
#[derive(Debug, Clone, Copy)]
pub struct ExecutionScheduler {
    strategy: SchedulingStrategy,
}

impl ExecutionScheduler {
    pub fn new(strategy: SchedulingStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> SchedulingStrategy {
        self.strategy
    }

    /// Get the next batch of stages to start
    ///
    /// `running` is the number of stages currently in flight.
    pub fn next_stages(
        &self,
        graph: &StageGraph,
        state: &PipelineState,
        statuses: &BTreeMap<StageId, StageState>,
        running: usize,
    ) -> Vec<StageId> {
        let capacity = match self.strategy {
            SchedulingStrategy::Sequential => usize::from(running == 0),
            SchedulingStrategy::Parallel => usize::MAX,
            SchedulingStrategy::LimitedParallel(max) => max.max(1).saturating_sub(running),
        };

        if capacity == 0 {
            return vec![];
        }

        graph
            .ready_stages(state, statuses)
            .into_iter()
            .take(capacity)
            .collect()
    }
}
