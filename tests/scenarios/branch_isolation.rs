//! Test: Branch Isolation - independent branches run concurrently and fail independently

use crate::helpers::*;
use std::time::Duration;
use video_digest::capability::CapabilityError;
use video_digest::core::{ExecutionStatus, StageError, StageId};

#[tokio::test]
async fn test_search_failure_keeps_summary_branch() {
    let report = Harness::new()
        .search(Err(CapabilityError::Api("HTTP 503".to_string())))
        .run()
        .await;

    assert_eq!(report.status, ExecutionStatus::Failed);
    assert_eq!(failed_stages(&report), vec![StageId::SuggestVideos]);
    assert!(matches!(report.errors[0].error, StageError::SearchUnavailable(_)));

    let state = &report.state;
    assert!(state.summary.is_some());
    assert!(state.questions.is_some());
    assert!(state.next_steps.is_some());
    assert!(state.keyword.is_some());
    assert!(state.video_suggestions.is_none());
    assert!(report.skipped().is_empty());
}

#[tokio::test]
async fn test_keyword_branch_overlaps_summary() {
    let harness = Harness::new().delay("summarize", Duration::from_millis(300));
    let report = harness.run().await;
    assert!(report.is_success());

    let summarize = harness.log.find("summarize").unwrap();
    let search = harness.log.find("search").unwrap();

    // The whole keyword branch finished while the summary was still running
    assert!(search.finished < summarize.finished);
}

#[tokio::test]
async fn test_questions_and_next_steps_fan_out() {
    let harness = Harness::new()
        .delay("questions", Duration::from_millis(200))
        .delay("next_steps", Duration::from_millis(200));
    let report = harness.run().await;
    assert!(report.is_success());

    let questions = harness.log.find("questions").unwrap();
    let next_steps = harness.log.find("next_steps").unwrap();
    assert!(questions.started < next_steps.finished);
    assert!(next_steps.started < questions.finished);
}

#[tokio::test]
async fn test_failed_branch_does_not_cancel_in_flight_sibling() {
    // Keyword fails immediately while the summary is still running
    let harness = Harness::new()
        .delay("summarize", Duration::from_millis(200))
        .fail("keyword", CapabilityError::RateLimited("quota".to_string()));
    let report = harness.run().await;

    assert_eq!(failed_stages(&report), vec![StageId::FindKeyword]);
    assert_stage_skipped(&report, StageId::SuggestVideos);
    assert_stage_completed(&report, StageId::SummarizeTranscript);
    assert_stage_completed(&report, StageId::GenerateQuestions);
    assert_stage_completed(&report, StageId::NextSteps);
}
