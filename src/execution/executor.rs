//! Stage executor - runs individual stages against the capabilities

use crate::{
    capability::Capabilities,
    core::{
        budget::InputBudget,
        error::StageError,
        stage::StageId,
        state::{PipelineState, StateUpdate},
    },
    execution::{prompts::Prompts, stages},
};
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info};

/// Executes a single stage
pub struct StageExecutor {
    capabilities: Capabilities,
    prompts: Prompts,
    budget: InputBudget,
    call_timeout: Duration,
}

impl StageExecutor {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            prompts: Prompts::default(),
            budget: InputBudget::default(),
            call_timeout: Duration::from_secs(120),
        }
    }

    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_budget(mut self, budget: InputBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Execute a stage against a snapshot of the state
    ///
    /// The returned update only ever holds fields the stage declares as
    /// outputs.
    pub async fn execute(
        &self,
        stage: StageId,
        state: &PipelineState,
    ) -> Result<StateUpdate, StageError> {
        info!("Executing stage: {}", stage);

        let update = match timeout(self.call_timeout, self.dispatch(stage, state)).await {
            Ok(Ok(update)) => update,
            Ok(Err(e)) => {
                error!("Stage {} failed: {}", stage, e);
                return Err(e);
            }
            Err(_) => {
                error!("Timeout for stage {} after {:?}", stage, self.call_timeout);
                let millis = u64::try_from(self.call_timeout.as_millis()).unwrap_or(u64::MAX);
                return Err(StageError::Timeout(millis));
            }
        };

        let spec = stage.spec();
        if let Some(field) = update.fields().into_iter().find(|f| !spec.writes_field(*f)) {
            error!("Stage {} wrote undeclared field {}", stage, field);
            return Err(StageError::StateConflict(format!(
                "stage {} may not write `{}`",
                stage, field
            )));
        }

        debug!("Stage {} produced {:?}", stage, update.fields());
        Ok(update)
    }

    async fn dispatch(
        &self,
        stage: StageId,
        state: &PipelineState,
    ) -> Result<StateUpdate, StageError> {
        let generator = self.capabilities.generator.as_ref();
        match stage {
            StageId::ExtractVideoId => {
                stages::extract_video_id(generator, &self.prompts, state).await
            }
            StageId::ExtractTranscript => {
                stages::extract_transcript(self.capabilities.transcripts.as_ref(), state).await
            }
            StageId::SummarizeTranscript => {
                stages::summarize_transcript(generator, &self.prompts, &self.budget, state).await
            }
            StageId::GenerateQuestions => {
                stages::generate_questions(generator, &self.prompts, state).await
            }
            StageId::NextSteps => stages::next_steps(generator, &self.prompts, state).await,
            StageId::FindKeyword => {
                stages::find_keyword(generator, &self.prompts, &self.budget, state).await
            }
            StageId::SuggestVideos => {
                stages::suggest_videos(self.capabilities.search.as_ref(), state).await
            }
        }
    }
}

/// Error recorded for a stage whose task ended without a result
pub fn aborted(stage: StageId, reason: &str) -> StageError {
    let message = format!("stage task aborted: {}", reason);
    match stage {
        StageId::ExtractVideoId | StageId::FindKeyword => StageError::Extraction(message),
        StageId::ExtractTranscript => StageError::TranscriptUnavailable(message),
        StageId::SuggestVideos => StageError::SearchUnavailable(message),
        StageId::SummarizeTranscript | StageId::GenerateQuestions | StageId::NextSteps => {
            StageError::Generation(message)
        }
    }
}
