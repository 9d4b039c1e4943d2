//! The digest stages
//!
//! Each stage reads a state snapshot, makes one capability call and returns
//! an update holding only the fields it owns.

use crate::capability::{
    CapabilityError, OutputShape, TextGenerator, TranscriptSnippet, TranscriptSource, VideoSearch,
};
use crate::core::{
    budget::InputBudget,
    error::StageError,
    state::{Field, PipelineState, StateUpdate},
};
use crate::execution::prompts::{render, Prompts};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Deserialize)]
struct VideoIdReply {
    video_id: String,
}

#[derive(Deserialize)]
struct KeywordReply {
    keyword: Vec<String>,
}

/// Ask the generator for the canonical id behind `video_url`
pub async fn extract_video_id(
    generator: &dyn TextGenerator,
    prompts: &Prompts,
    state: &PipelineState,
) -> Result<StateUpdate, StageError> {
    let prompt = render(
        &prompts.extract_video_id,
        &[("video_url", state.video_url.as_str())],
    );
    let value = generate_structured(generator, &prompt, &OutputShape::video_id()).await?;
    let reply: VideoIdReply =
        serde_json::from_value(value).map_err(|e| StageError::Extraction(e.to_string()))?;

    let video_id = reply.video_id.trim();
    if video_id.is_empty() || video_id.chars().any(char::is_whitespace) {
        return Err(StageError::Extraction(format!(
            "`{}` is not a video id",
            reply.video_id
        )));
    }

    debug!("Extracted video id {}", video_id);
    Ok(StateUpdate::video_id(video_id))
}

/// Fetch the transcript and flatten it to a single string
pub async fn extract_transcript(
    source: &dyn TranscriptSource,
    state: &PipelineState,
) -> Result<StateUpdate, StageError> {
    let video_id = input(state.video_id.as_deref(), Field::VideoId)?;

    let snippets = source.fetch(video_id).await.map_err(|e| match e {
        CapabilityError::Timeout(ms) => StageError::Timeout(ms),
        other => StageError::TranscriptUnavailable(other.to_string()),
    })?;

    if snippets.is_empty() {
        return Err(StageError::TranscriptUnavailable(format!(
            "{} has an empty transcript",
            video_id
        )));
    }

    debug!("Joining {} transcript snippets", snippets.len());
    Ok(StateUpdate::transcript(join_snippets(&snippets)))
}

/// Snippet texts in order, separated by a single space
pub fn join_snippets(snippets: &[TranscriptSnippet]) -> String {
    snippets
        .iter()
        .map(|snippet| snippet.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

pub async fn summarize_transcript(
    generator: &dyn TextGenerator,
    prompts: &Prompts,
    budget: &InputBudget,
    state: &PipelineState,
) -> Result<StateUpdate, StageError> {
    let transcript = input(state.transcript.as_deref(), Field::Transcript)?;
    let transcript = budget
        .fit(transcript)
        .map_err(|e| StageError::Generation(e.to_string()))?;

    let prompt = render(&prompts.summarize, &[("transcript", transcript.as_ref())]);
    let summary = generate_text(generator, &prompt).await?;
    Ok(StateUpdate::summary(summary))
}

pub async fn generate_questions(
    generator: &dyn TextGenerator,
    prompts: &Prompts,
    state: &PipelineState,
) -> Result<StateUpdate, StageError> {
    let summary = input(state.summary.as_deref(), Field::Summary)?;
    let prompt = render(&prompts.questions, &[("summary", summary)]);
    let questions = generate_text(generator, &prompt).await?;
    Ok(StateUpdate::questions(questions))
}

pub async fn next_steps(
    generator: &dyn TextGenerator,
    prompts: &Prompts,
    state: &PipelineState,
) -> Result<StateUpdate, StageError> {
    let summary = input(state.summary.as_deref(), Field::Summary)?;
    let prompt = render(&prompts.next_steps, &[("summary", summary)]);
    let steps = generate_text(generator, &prompt).await?;
    Ok(StateUpdate::next_steps(steps))
}

/// Extract search keywords as a list of strings
pub async fn find_keyword(
    generator: &dyn TextGenerator,
    prompts: &Prompts,
    budget: &InputBudget,
    state: &PipelineState,
) -> Result<StateUpdate, StageError> {
    let transcript = input(state.transcript.as_deref(), Field::Transcript)?;
    let transcript = budget
        .fit(transcript)
        .map_err(|e| StageError::Generation(e.to_string()))?;

    let prompt = render(&prompts.keyword, &[("transcript", transcript.as_ref())]);
    let value = generate_structured(generator, &prompt, &OutputShape::keywords()).await?;
    let reply: KeywordReply =
        serde_json::from_value(value).map_err(|e| StageError::Extraction(e.to_string()))?;

    let keywords: Vec<String> = reply
        .keyword
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();

    if keywords.is_empty() {
        return Err(StageError::Extraction("no keywords in response".to_string()));
    }

    debug!("Keywords: {:?}", keywords);
    Ok(StateUpdate::keyword(keywords))
}

pub async fn suggest_videos(
    search: &dyn VideoSearch,
    state: &PipelineState,
) -> Result<StateUpdate, StageError> {
    let keywords = state
        .keyword
        .as_deref()
        .ok_or_else(|| missing_input(Field::Keyword))?;

    let listing = search.search(keywords).await.map_err(|e| match e {
        CapabilityError::Timeout(ms) => StageError::Timeout(ms),
        other => StageError::SearchUnavailable(other.to_string()),
    })?;

    if listing.trim().is_empty() {
        warn!("No videos found for {:?}", keywords);
    }

    Ok(StateUpdate::video_suggestions(listing))
}

async fn generate_text(generator: &dyn TextGenerator, prompt: &str) -> Result<String, StageError> {
    debug!("Prompt of {} bytes", prompt.len());
    let text = generator
        .generate(prompt, None)
        .await
        .map_err(generation_error)?
        .into_text()
        .ok_or_else(|| {
            StageError::Generation("expected free text, got a structured value".to_string())
        })?;

    let text = text.trim();
    if text.is_empty() {
        return Err(StageError::Generation("empty response".to_string()));
    }
    Ok(text.to_string())
}

async fn generate_structured(
    generator: &dyn TextGenerator,
    prompt: &str,
    shape: &OutputShape,
) -> Result<Value, StageError> {
    debug!("`{}` prompt of {} bytes", shape.name, prompt.len());
    generator
        .generate(prompt, Some(shape))
        .await
        .map_err(extraction_error)?
        .into_structured()
        .ok_or_else(|| {
            StageError::Extraction(format!("expected a `{}` value, got free text", shape.name))
        })
}

fn generation_error(err: CapabilityError) -> StageError {
    match err {
        CapabilityError::Timeout(ms) => StageError::Timeout(ms),
        CapabilityError::NonConforming { .. } => StageError::Extraction(err.to_string()),
        other => StageError::Generation(other.to_string()),
    }
}

fn extraction_error(err: CapabilityError) -> StageError {
    match err {
        CapabilityError::Timeout(ms) => StageError::Timeout(ms),
        other => StageError::Extraction(other.to_string()),
    }
}

fn input(value: Option<&str>, field: Field) -> Result<&str, StageError> {
    value.ok_or_else(|| missing_input(field))
}

fn missing_input(field: Field) -> StageError {
    StageError::StateConflict(format!("input `{}` is not populated", field))
}
