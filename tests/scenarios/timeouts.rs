//! Test: Timeouts and cancellation - a hung call fails only its own stage

use crate::helpers::*;
use std::time::{Duration, Instant};
use video_digest::core::{StageError, StageId};
use video_digest::execution::SchedulingStrategy;

#[tokio::test]
async fn test_slow_generation_times_out() {
    let started = Instant::now();
    let report = Harness::new()
        .timeout(Duration::from_secs(1))
        .delay("questions", Duration::from_secs(30))
        .run()
        .await;

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(failed_stages(&report), vec![StageId::GenerateQuestions]);
    assert_eq!(report.errors[0].error, StageError::Timeout(1000));
    assert!(report.state.questions.is_none());
    assert!(report.state.next_steps.is_some());
    assert!(report.state.video_suggestions.is_some());
}

#[tokio::test]
async fn test_slow_search_times_out() {
    let report = Harness::new()
        .timeout(Duration::from_secs(1))
        .search_delay(Duration::from_secs(30))
        .run()
        .await;

    assert_eq!(failed_stages(&report), vec![StageId::SuggestVideos]);
    assert_eq!(report.errors[0].error, StageError::Timeout(1000));
    assert!(report.state.keyword.is_some());
}

#[tokio::test]
async fn test_dropping_a_run_aborts_its_stages() {
    let harness = Harness::new().delay("summarize", Duration::from_millis(300));
    let engine = harness.engine(SchedulingStrategy::Parallel);

    let cancelled = tokio::time::timeout(Duration::from_millis(100), engine.run(VIDEO_URL)).await;
    assert!(cancelled.is_err());

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(harness.log.find("transcript").is_some());
    assert!(harness.log.find("summarize").is_none());
}
