//! Test: Determinism - identical inputs give identical results under any schedule

use crate::helpers::*;
use std::time::Duration;
use video_digest::capability::CapabilityError;
use video_digest::execution::SchedulingStrategy;

#[tokio::test]
async fn test_repeated_runs_match() {
    let harness = Harness::new();
    let first = harness.run().await;
    let second = harness.run().await;

    assert_eq!(first.state, second.state);
    assert_eq!(first.errors, second.errors);
    assert_ne!(first.run_id, second.run_id);
}

#[tokio::test]
async fn test_strategies_agree() {
    let harness = Harness::new()
        .delay("summarize", Duration::from_millis(50))
        .search(Err(CapabilityError::NotAvailable("offline".to_string())));

    let sequential = harness.engine(SchedulingStrategy::Sequential).run(VIDEO_URL).await;
    let parallel = harness.engine(SchedulingStrategy::Parallel).run(VIDEO_URL).await;
    let limited = harness
        .engine(SchedulingStrategy::LimitedParallel(2))
        .run(VIDEO_URL)
        .await;

    assert_eq!(sequential.state, parallel.state);
    assert_eq!(parallel.state, limited.state);
    assert_eq!(sequential.errors, parallel.errors);
    assert_eq!(parallel.errors, limited.errors);
}

#[tokio::test]
async fn test_completion_order_does_not_change_state() {
    let slow_summary = Harness::new()
        .delay("summarize", Duration::from_millis(150))
        .run()
        .await;
    let slow_keyword = Harness::new()
        .delay("keyword", Duration::from_millis(150))
        .run()
        .await;

    assert_eq!(slow_summary.state, slow_keyword.state);
}

#[tokio::test]
async fn test_report_serializes() {
    let report = Harness::new()
        .search(Err(CapabilityError::NotAvailable("offline".to_string())))
        .run()
        .await;

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status"], "failed");
    assert_eq!(json["state"]["video_id"], VIDEO_ID);
    assert_eq!(json["state"]["video_suggestions"], serde_json::Value::Null);
    assert_eq!(json["errors"][0]["stage"], "suggest_videos");
    assert_eq!(json["errors"][0]["error"]["kind"], "search_unavailable");
    assert_eq!(json["stages"]["suggest_videos"]["status"], "failed");
}
