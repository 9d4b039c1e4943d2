//! Test: Input Budget - transcript size limits on text-generation stages

use crate::helpers::*;
use video_digest::capability::TranscriptSnippet;
use video_digest::core::{BudgetPolicy, InputBudget, StageError, StageId, TokenCounter};

fn approximate(max_tokens: usize, policy: BudgetPolicy) -> InputBudget {
    InputBudget::new(max_tokens, policy).with_counter(TokenCounter::approximate())
}

fn long_transcript() -> Result<Vec<TranscriptSnippet>, video_digest::CapabilityError> {
    // 10 snippets of 9 chars joined by spaces: 99 chars, ~25 tokens
    Ok((0..10)
        .map(|i| TranscriptSnippet::new(format!("segment-{}", i), i as f64, 1.0))
        .collect())
}

#[tokio::test]
async fn test_truncate_policy_cuts_prompt_input() {
    let harness = Harness::new()
        .transcript(long_transcript())
        .budget(approximate(5, BudgetPolicy::Truncate));
    let report = harness.run().await;

    assert!(report.is_success());
    // The stored transcript is untouched
    assert_eq!(report.state.transcript.as_ref().map(|t| t.len()), Some(99));

    let summarize = harness.log.find("summarize").unwrap();
    assert_eq!(summarize.input, "segment-0 segment-1 ");
    assert_eq!(harness.log.find("keyword").unwrap().input, summarize.input);
}

#[tokio::test]
async fn test_reject_policy_fails_both_transcript_readers() {
    let harness = Harness::new()
        .transcript(long_transcript())
        .budget(approximate(5, BudgetPolicy::Reject));
    let report = harness.run().await;

    assert_eq!(
        failed_stages(&report),
        vec![StageId::SummarizeTranscript, StageId::FindKeyword]
    );
    assert!(report
        .errors
        .iter()
        .all(|failure| matches!(failure.error, StageError::Generation(_))));
    assert_eq!(report.skipped().len(), 3);
    assert!(harness.log.find("summarize").is_none());
}

#[tokio::test]
async fn test_off_policy_passes_everything() {
    let harness = Harness::new()
        .transcript(long_transcript())
        .budget(InputBudget::new(1, BudgetPolicy::Off));
    let report = harness.run().await;

    assert!(report.is_success());
    assert_eq!(harness.log.find("summarize").unwrap().input.len(), 99);
}

#[tokio::test]
async fn test_bpe_budget_counts_real_tokens() {
    // One short common word per snippet, far under 1 token per 4 chars
    let words: Vec<_> = ["the"; 30]
        .iter()
        .enumerate()
        .map(|(i, w)| TranscriptSnippet::new(*w, i as f64, 1.0))
        .collect();
    let harness = Harness::new()
        .transcript(Ok(words))
        .budget(InputBudget::new(10, BudgetPolicy::Truncate));
    let report = harness.run().await;

    assert!(report.is_success());
    assert_eq!(
        harness.log.find("summarize").unwrap().input.split_whitespace().count(),
        10
    );
}
