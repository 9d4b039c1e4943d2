//! Test: Failure Handling - a failed stage skips exactly its descendants

use crate::helpers::*;
use serde_json::json;
use std::time::Duration;
use video_digest::capability::{CapabilityError, Generation, OutputShape};
use video_digest::core::{ExecutionStatus, Field, StageError, StageId};
use video_digest::execution::ExecutionEvent;

#[tokio::test]
async fn test_transcript_unavailable() {
    let harness = Harness::new().transcript(Err(CapabilityError::NotAvailable(
        "captions are disabled".to_string(),
    )));
    let report = harness.run().await;

    assert_eq!(report.status, ExecutionStatus::Failed);
    assert_eq!(failed_stages(&report), vec![StageId::ExtractTranscript]);
    assert!(matches!(
        report.errors[0].error,
        StageError::TranscriptUnavailable(_)
    ));

    assert_eq!(report.state.populated(), vec![Field::VideoUrl, Field::VideoId]);
    assert_stage_completed(&report, StageId::ExtractVideoId);
    for stage in [
        StageId::SummarizeTranscript,
        StageId::GenerateQuestions,
        StageId::NextSteps,
        StageId::FindKeyword,
        StageId::SuggestVideos,
    ] {
        assert_stage_skipped(&report, stage);
    }

    // Nothing downstream of the transcript was attempted
    assert_eq!(harness.log.tags(), vec!["extract_video_id", "transcript"]);
}

#[tokio::test]
async fn test_malformed_url() {
    let harness = Harness::new().fail(
        "extract_video_id",
        OutputShape::video_id().non_conforming("no id in `not a url`"),
    );
    let report = harness.run().await;

    assert_eq!(failed_stages(&report), vec![StageId::ExtractVideoId]);
    assert!(matches!(report.errors[0].error, StageError::Extraction(_)));
    assert_eq!(report.state.populated(), vec![Field::VideoUrl]);
    assert_eq!(report.skipped().len(), 6);
}

#[tokio::test]
async fn test_blank_video_id_is_an_extraction_error() {
    let report = Harness::new()
        .reply(
            "extract_video_id",
            Generation::Structured(json!({ "video_id": "" })),
        )
        .run()
        .await;

    assert_eq!(failed_stages(&report), vec![StageId::ExtractVideoId]);
    assert!(matches!(report.errors[0].error, StageError::Extraction(_)));
}

#[tokio::test]
async fn test_summary_failure_keeps_keyword_branch() {
    let report = Harness::new()
        .fail("summarize", CapabilityError::Api("model overloaded".to_string()))
        .run()
        .await;

    assert_eq!(failed_stages(&report), vec![StageId::SummarizeTranscript]);
    assert!(matches!(report.errors[0].error, StageError::Generation(_)));

    assert_stage_skipped(&report, StageId::GenerateQuestions);
    assert_stage_skipped(&report, StageId::NextSteps);
    assert_stage_completed(&report, StageId::FindKeyword);
    assert_stage_completed(&report, StageId::SuggestVideos);
    assert!(report.state.keyword.is_some());
    assert!(report.state.video_suggestions.is_some());
    assert!(report.state.summary.is_none());
}

#[tokio::test]
async fn test_free_text_keyword_is_rejected() {
    let report = Harness::new()
        .fail("keyword", OutputShape::keywords().non_conforming("expected a JSON object"))
        .run()
        .await;

    assert_eq!(failed_stages(&report), vec![StageId::FindKeyword]);
    assert!(matches!(report.errors[0].error, StageError::Extraction(_)));
    assert_stage_skipped(&report, StageId::SuggestVideos);
    assert!(report.state.keyword.is_none());
    assert!(report.state.questions.is_some());
    assert!(report.state.next_steps.is_some());
}

#[tokio::test]
async fn test_empty_generation_fails_stage() {
    let report = Harness::new()
        .reply("next_steps", Generation::Text("   ".to_string()))
        .run()
        .await;

    assert_eq!(failed_stages(&report), vec![StageId::NextSteps]);
    assert_eq!(
        report.errors[0].error,
        StageError::Generation("empty response".to_string())
    );
    assert!(report.state.questions.is_some());
}

#[tokio::test]
async fn test_errors_follow_execution_order() {
    // The search fails long before the slow questions stage does
    let report = Harness::new()
        .delay("questions", Duration::from_millis(200))
        .fail("questions", CapabilityError::Api("boom".to_string()))
        .search(Err(CapabilityError::NotAvailable("offline".to_string())))
        .run()
        .await;

    assert_eq!(
        failed_stages(&report),
        vec![StageId::GenerateQuestions, StageId::SuggestVideos]
    );
    assert!(matches!(report.errors[1].error, StageError::SearchUnavailable(_)));
    assert!(report.state.next_steps.is_some());
}

#[tokio::test]
async fn test_skip_events_name_the_failed_stage() {
    let (_, events) = Harness::new()
        .transcript(Err(CapabilityError::NotAvailable("private video".to_string())))
        .run_with_events()
        .await;

    let reasons: Vec<&String> = events
        .iter()
        .filter_map(|e| match e {
            ExecutionEvent::StageSkipped { reason, .. } => Some(reason),
            _ => None,
        })
        .collect();

    assert_eq!(reasons.len(), 5);
    assert!(reasons
        .iter()
        .all(|reason| reason.as_str() == "upstream failure in extract_transcript"));
}
