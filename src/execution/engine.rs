//! Main execution engine - orchestrates a whole digest run

use crate::{
    capability::{
        Capabilities, CapabilityError, LlmClientConfig, OpenAiGenerator, YoutubeSearch,
        YoutubeTranscripts,
    },
    core::{
        config::Settings,
        error::{StageError, StageFailure},
        graph::StageGraph,
        report::RunReport,
        stage::StageId,
        state::{Field, PipelineState, StateUpdate},
        status::{ExecutionStatus, StageState},
    },
    execution::{
        executor::{self, StageExecutor},
        prompts::Prompts,
        scheduler::{ExecutionScheduler, SchedulingStrategy},
    },
};
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::task::{self, JoinSet};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Events that can occur during a run
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted {
        run_id: Uuid,
        video_url: String,
    },
    StageStarted {
        stage: StageId,
    },
    StageCompleted {
        stage: StageId,
        fields: Vec<Field>,
    },
    StageFailed {
        stage: StageId,
        error: StageError,
    },
    StageSkipped {
        stage: StageId,
        reason: String,
    },
    RunCompleted {
        run_id: Uuid,
        status: ExecutionStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

type StageOutcome = Result<StateUpdate, StageError>;

/// Bookkeeping for one run; only the engine loop touches it
struct RunProgress {
    state: PipelineState,
    statuses: BTreeMap<StageId, StageState>,
    errors: Vec<StageFailure>,
    tasks: HashMap<task::Id, StageId>,
}

/// Digest pipeline execution engine
pub struct ExecutionEngine {
    graph: StageGraph,
    scheduler: ExecutionScheduler,
    executor: Arc<StageExecutor>,
    event_handlers: Vec<EventHandler>,
}

impl ExecutionEngine {
    pub fn new(executor: StageExecutor, strategy: SchedulingStrategy) -> Self {
        Self {
            graph: StageGraph::digest(),
            scheduler: ExecutionScheduler::new(strategy),
            executor: Arc::new(executor),
            event_handlers: Vec::new(),
        }
    }

    /// Build an engine wired to the live services
    pub fn from_settings(settings: &Settings) -> Result<Self, CapabilityError> {
        let generator = OpenAiGenerator::new(LlmClientConfig::from_settings(
            &settings.llm,
            &settings.execution,
        ))?;
        let transcripts = YoutubeTranscripts::new(&settings.transcript)?;
        let search = YoutubeSearch::new(
            settings.search.max_results,
            settings.execution.call_timeout(),
        )?;

        let executor = StageExecutor::new(Capabilities::new(generator, transcripts, search))
            .with_prompts(Prompts::from_overrides(&settings.prompts))
            .with_budget(settings.budget.to_budget())
            .with_timeout(settings.execution.call_timeout());

        Ok(Self::new(executor, SchedulingStrategy::from(&settings.execution)))
    }

    pub fn graph(&self) -> &StageGraph {
        &self.graph
    }

    pub fn strategy(&self) -> SchedulingStrategy {
        self.scheduler.strategy()
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    /// Emit an event to all handlers
    fn emit_event(&self, event: ExecutionEvent) {
        for handler in &self.event_handlers {
            handler(event.clone());
        }
    }

    /// Run the digest pipeline for one video URL
    ///
    /// Never fails as a whole: stage failures are collected in the report
    /// next to whatever state the other stages produced. Dropping the
    /// returned future aborts every stage still in flight.
    pub async fn run(&self, video_url: &str) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        info!("Starting digest run {} for {}", run_id, video_url);
        self.emit_event(ExecutionEvent::RunStarted {
            run_id,
            video_url: video_url.to_string(),
        });

        let mut progress = RunProgress {
            state: PipelineState::new(video_url),
            statuses: self
                .graph
                .execution_order()
                .iter()
                .map(|id| (*id, StageState::Pending))
                .collect(),
            errors: Vec::new(),
            tasks: HashMap::new(),
        };
        let mut in_flight: JoinSet<StageOutcome> = JoinSet::new();

        loop {
            let ready = self.scheduler.next_stages(
                &self.graph,
                &progress.state,
                &progress.statuses,
                in_flight.len(),
            );

            for stage in ready {
                self.start_stage(stage, &mut progress, &mut in_flight);
            }

            let Some(joined) = in_flight.join_next_with_id().await else {
                break;
            };

            let (id, result) = match joined {
                Ok((id, result)) => (id, result),
                Err(e) => {
                    let id = e.id();
                    let Some(stage) = progress.tasks.get(&id).copied() else {
                        error!("Lost track of a stage task: {}", e);
                        continue;
                    };
                    error!("Stage {} task ended abnormally: {}", stage, e);
                    (id, Err(executor::aborted(stage, &e.to_string())))
                }
            };

            if let Some(stage) = progress.tasks.remove(&id) {
                self.settle_stage(stage, result, &mut progress);
            }
        }

        self.skip_unreachable(&mut progress);

        let RunProgress {
            state,
            statuses,
            mut errors,
            ..
        } = progress;
        errors.sort_by_key(|failure| self.graph.rank(failure.stage));

        let status = if errors.is_empty() {
            ExecutionStatus::Completed
        } else {
            ExecutionStatus::Failed
        };

        info!(
            "Digest run {} finished: {:?} ({} errors)",
            run_id,
            status,
            errors.len()
        );
        self.emit_event(ExecutionEvent::RunCompleted { run_id, status });

        RunReport {
            run_id,
            status,
            state,
            errors,
            stages: statuses,
            started_at,
            completed_at: Utc::now(),
        }
    }

    fn start_stage(
        &self,
        stage: StageId,
        progress: &mut RunProgress,
        in_flight: &mut JoinSet<StageOutcome>,
    ) {
        progress.statuses.insert(
            stage,
            StageState::Running {
                started_at: Utc::now(),
            },
        );
        self.emit_event(ExecutionEvent::StageStarted { stage });

        let executor = Arc::clone(&self.executor);
        let snapshot = progress.state.clone();
        let handle = in_flight.spawn(async move { executor.execute(stage, &snapshot).await });

        // A panic inside the stage surfaces as a JoinError carrying this id
        progress.tasks.insert(handle.id(), stage);
    }

    /// Merge a finished stage's result into the run
    fn settle_stage(
        &self,
        stage: StageId,
        result: Result<StateUpdate, StageError>,
        progress: &mut RunProgress,
    ) {
        let started_at = match progress.statuses.get(&stage) {
            Some(StageState::Running { started_at }) => *started_at,
            _ => Utc::now(),
        };

        let merged = result.and_then(|update| {
            let fields = update.fields();
            progress
                .state
                .merge(update)
                .map(|state| (state, fields))
                .map_err(StageError::from)
        });

        match merged {
            Ok((state, fields)) => {
                info!("Stage {} completed", stage);
                progress.state = state;
                progress.statuses.insert(
                    stage,
                    StageState::Completed {
                        fields: fields.clone(),
                        started_at,
                        completed_at: Utc::now(),
                    },
                );
                self.emit_event(ExecutionEvent::StageCompleted { stage, fields });
            }
            Err(error) => {
                warn!("Stage {} failed: {}", stage, error);
                progress.statuses.insert(
                    stage,
                    StageState::Failed {
                        error: error.clone(),
                        started_at,
                        failed_at: Utc::now(),
                    },
                );
                progress.errors.push(StageFailure {
                    stage,
                    error: error.clone(),
                });
                self.emit_event(ExecutionEvent::StageFailed { stage, error });

                let reason = format!("upstream failure in {}", stage);
                for descendant in self.graph.descendants(stage) {
                    self.skip_stage(descendant, &reason, progress);
                }
            }
        }
    }

    /// Mark stages whose inputs can no longer appear
    fn skip_unreachable(&self, progress: &mut RunProgress) {
        for stage in self.graph.execution_order() {
            self.skip_stage(*stage, "inputs never became available", progress);
        }
    }

    fn skip_stage(&self, stage: StageId, reason: &str, progress: &mut RunProgress) {
        if !matches!(progress.statuses.get(&stage), Some(StageState::Pending)) {
            return;
        }

        info!("Skipping stage {}: {}", stage, reason);
        progress.statuses.insert(
            stage,
            StageState::Skipped {
                reason: reason.to_string(),
            },
        );
        self.emit_event(ExecutionEvent::StageSkipped {
            stage,
            reason: reason.to_string(),
        });
    }
}
