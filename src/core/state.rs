//! Pipeline state - the record threaded through every stage

use crate::core::error::StateConflict;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named slot of the pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    VideoUrl,
    VideoId,
    Transcript,
    Summary,
    Keyword,
    VideoSuggestions,
    Questions,
    NextSteps,
}

impl Field {
    /// All fields in declaration order
    pub const ALL: [Field; 8] = [
        Field::VideoUrl,
        Field::VideoId,
        Field::Transcript,
        Field::Summary,
        Field::Keyword,
        Field::VideoSuggestions,
        Field::Questions,
        Field::NextSteps,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::VideoUrl => "video_url",
            Field::VideoId => "video_id",
            Field::Transcript => "transcript",
            Field::Summary => "summary",
            Field::Keyword => "keyword",
            Field::VideoSuggestions => "video_suggestions",
            Field::Questions => "questions",
            Field::NextSteps => "next_steps",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accumulated result of a pipeline run
///
/// Only `video_url` is set at creation. Every other field is written at most
/// once, by the stage that owns it, through [`PipelineState::merge`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineState {
    pub video_url: String,
    pub video_id: Option<String>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub keyword: Option<Vec<String>>,
    pub video_suggestions: Option<String>,
    pub questions: Option<String>,
    pub next_steps: Option<String>,
}

impl PipelineState {
    /// Seed a new state from the input URL
    pub fn new(video_url: impl Into<String>) -> Self {
        Self {
            video_url: video_url.into(),
            video_id: None,
            transcript: None,
            summary: None,
            keyword: None,
            video_suggestions: None,
            questions: None,
            next_steps: None,
        }
    }

    /// Check whether a field holds a value
    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::VideoUrl => true,
            Field::VideoId => self.video_id.is_some(),
            Field::Transcript => self.transcript.is_some(),
            Field::Summary => self.summary.is_some(),
            Field::Keyword => self.keyword.is_some(),
            Field::VideoSuggestions => self.video_suggestions.is_some(),
            Field::Questions => self.questions.is_some(),
            Field::NextSteps => self.next_steps.is_some(),
        }
    }

    /// Fields currently populated, in declaration order
    pub fn populated(&self) -> Vec<Field> {
        Field::ALL.into_iter().filter(|f| self.has(*f)).collect()
    }

    /// Produce a new state with the update's fields set
    ///
    /// Fails without side effects if the update targets a field that is
    /// already populated. Updates over disjoint fields commute.
    pub fn merge(&self, update: StateUpdate) -> Result<PipelineState, StateConflict> {
        let mut next = self.clone();
        fill(&mut next.video_id, update.video_id, Field::VideoId)?;
        fill(&mut next.transcript, update.transcript, Field::Transcript)?;
        fill(&mut next.summary, update.summary, Field::Summary)?;
        fill(&mut next.keyword, update.keyword, Field::Keyword)?;
        fill(
            &mut next.video_suggestions,
            update.video_suggestions,
            Field::VideoSuggestions,
        )?;
        fill(&mut next.questions, update.questions, Field::Questions)?;
        fill(&mut next.next_steps, update.next_steps, Field::NextSteps)?;
        Ok(next)
    }
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>, field: Field) -> Result<(), StateConflict> {
    match (slot.is_some(), value) {
        (_, None) => Ok(()),
        (true, Some(_)) => Err(StateConflict(field)),
        (false, Some(value)) => {
            *slot = Some(value);
            Ok(())
        }
    }
}

/// Partial output of a stage
///
/// `video_url` is absent on purpose: it is seeded by the caller and never
/// written by a stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateUpdate {
    pub video_id: Option<String>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub keyword: Option<Vec<String>>,
    pub video_suggestions: Option<String>,
    pub questions: Option<String>,
    pub next_steps: Option<String>,
}

impl StateUpdate {
    pub fn video_id(value: impl Into<String>) -> Self {
        Self {
            video_id: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn transcript(value: impl Into<String>) -> Self {
        Self {
            transcript: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn summary(value: impl Into<String>) -> Self {
        Self {
            summary: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn keyword(value: Vec<String>) -> Self {
        Self {
            keyword: Some(value),
            ..Self::default()
        }
    }

    pub fn video_suggestions(value: impl Into<String>) -> Self {
        Self {
            video_suggestions: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn questions(value: impl Into<String>) -> Self {
        Self {
            questions: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn next_steps(value: impl Into<String>) -> Self {
        Self {
            next_steps: Some(value.into()),
            ..Self::default()
        }
    }

    /// Fields this update writes, in declaration order
    pub fn fields(&self) -> Vec<Field> {
        let mut fields = Vec::new();
        if self.video_id.is_some() {
            fields.push(Field::VideoId);
        }
        if self.transcript.is_some() {
            fields.push(Field::Transcript);
        }
        if self.summary.is_some() {
            fields.push(Field::Summary);
        }
        if self.keyword.is_some() {
            fields.push(Field::Keyword);
        }
        if self.video_suggestions.is_some() {
            fields.push(Field::VideoSuggestions);
        }
        if self.questions.is_some() {
            fields.push(Field::Questions);
        }
        if self.next_steps.is_some() {
            fields.push(Field::NextSteps);
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}
