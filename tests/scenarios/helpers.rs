//! Stub capabilities and assertions for scenario tests

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use video_digest::capability::{
    Capabilities, CapabilityError, Generation, OutputShape, TextGenerator, TranscriptSnippet,
    TranscriptSource, VideoSearch,
};
use video_digest::core::{BudgetPolicy, InputBudget, RunReport, StageId, StageState};
use video_digest::execution::{
    ExecutionEngine, ExecutionEvent, Prompts, SchedulingStrategy, StageExecutor,
};

pub const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
pub const VIDEO_ID: &str = "dQw4w9WgXcQ";

/// Templates tagged so the stub generator knows which stage is calling
pub fn tagged_prompts() -> Prompts {
    Prompts {
        extract_video_id: "[extract_video_id] {{ video_url }}".to_string(),
        summarize: "[summarize] {{ transcript }}".to_string(),
        questions: "[questions] {{ summary }}".to_string(),
        next_steps: "[next_steps] {{ summary }}".to_string(),
        keyword: "[keyword] {{ transcript }}".to_string(),
    }
}

/// One recorded capability call
#[derive(Debug, Clone)]
pub struct Call {
    pub tag: String,
    pub input: String,
    pub started: Instant,
    pub finished: Instant,
}

#[derive(Clone)]
enum Behavior {
    Reply(Generation),
    Fail(CapabilityError),
}

/// Shared record of every call made during a run
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn record(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn tags(&self) -> Vec<String> {
        let mut calls = self.calls();
        calls.sort_by_key(|c| c.started);
        calls.into_iter().map(|c| c.tag).collect()
    }

    pub fn find(&self, tag: &str) -> Option<Call> {
        self.calls().into_iter().find(|c| c.tag == tag)
    }
}

struct StubGenerator {
    behaviors: HashMap<String, Behavior>,
    delays: HashMap<String, Duration>,
    log: CallLog,
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(
        &self,
        prompt: &str,
        _shape: Option<&OutputShape>,
    ) -> Result<Generation, CapabilityError> {
        let started = Instant::now();
        let (tag, input) = prompt
            .strip_prefix('[')
            .and_then(|rest| rest.split_once("] "))
            .unwrap_or(("unknown", prompt));

        if let Some(delay) = self.delays.get(tag) {
            tokio::time::sleep(*delay).await;
        }

        self.log.record(Call {
            tag: tag.to_string(),
            input: input.to_string(),
            started,
            finished: Instant::now(),
        });

        match self.behaviors.get(tag) {
            Some(Behavior::Reply(reply)) => Ok(reply.clone()),
            Some(Behavior::Fail(err)) => Err(err.clone()),
            None => Err(CapabilityError::Internal(format!("unexpected prompt: {}", prompt))),
        }
    }
}

struct StubTranscripts {
    result: Result<Vec<TranscriptSnippet>, CapabilityError>,
    log: CallLog,
}

#[async_trait]
impl TranscriptSource for StubTranscripts {
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSnippet>, CapabilityError> {
        let now = Instant::now();
        self.log.record(Call {
            tag: "transcript".to_string(),
            input: video_id.to_string(),
            started: now,
            finished: now,
        });
        self.result.clone()
    }
}

struct StubSearch {
    result: Result<String, CapabilityError>,
    delay: Option<Duration>,
    log: CallLog,
}

#[async_trait]
impl VideoSearch for StubSearch {
    async fn search(&self, terms: &[String]) -> Result<String, CapabilityError> {
        let started = Instant::now();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.log.record(Call {
            tag: "search".to_string(),
            input: terms.join(","),
            started,
            finished: Instant::now(),
        });
        self.result.clone()
    }
}

/// Builder for an engine wired to stub capabilities
pub struct Harness {
    behaviors: HashMap<String, Behavior>,
    delays: HashMap<String, Duration>,
    transcript: Result<Vec<TranscriptSnippet>, CapabilityError>,
    search: Result<String, CapabilityError>,
    search_delay: Option<Duration>,
    budget: InputBudget,
    timeout: Duration,
    pub log: CallLog,
}

impl Harness {
    /// Every capability succeeds
    pub fn new() -> Self {
        let mut behaviors = HashMap::new();
        behaviors.insert(
            "extract_video_id".to_string(),
            Behavior::Reply(Generation::Structured(json!({ "video_id": VIDEO_ID }))),
        );
        behaviors.insert(
            "summarize".to_string(),
            Behavior::Reply(Generation::Text("A talk about async Rust.".to_string())),
        );
        behaviors.insert(
            "questions".to_string(),
            Behavior::Reply(Generation::Text("1. What is a future?".to_string())),
        );
        behaviors.insert(
            "next_steps".to_string(),
            Behavior::Reply(Generation::Text("Build a small tokio service.".to_string())),
        );
        behaviors.insert(
            "keyword".to_string(),
            Behavior::Reply(Generation::Structured(json!({ "keyword": ["async rust", "tokio"] }))),
        );

        Self {
            behaviors,
            delays: HashMap::new(),
            transcript: Ok(vec![
                TranscriptSnippet::new("welcome to", 0.0, 1.5),
                TranscriptSnippet::new("async rust", 1.5, 2.0),
            ]),
            search: Ok("https://www.youtube.com/watch?v=aaaaaaaaaaa".to_string()),
            search_delay: None,
            budget: InputBudget::new(6000, BudgetPolicy::Truncate),
            timeout: Duration::from_secs(10),
            log: CallLog::default(),
        }
    }

    pub fn reply(mut self, tag: &str, reply: Generation) -> Self {
        self.behaviors.insert(tag.to_string(), Behavior::Reply(reply));
        self
    }

    pub fn fail(mut self, tag: &str, err: CapabilityError) -> Self {
        self.behaviors.insert(tag.to_string(), Behavior::Fail(err));
        self
    }

    pub fn delay(mut self, tag: &str, delay: Duration) -> Self {
        self.delays.insert(tag.to_string(), delay);
        self
    }

    pub fn transcript(mut self, result: Result<Vec<TranscriptSnippet>, CapabilityError>) -> Self {
        self.transcript = result;
        self
    }

    pub fn search(mut self, result: Result<String, CapabilityError>) -> Self {
        self.search = result;
        self
    }

    pub fn search_delay(mut self, delay: Duration) -> Self {
        self.search_delay = Some(delay);
        self
    }

    pub fn budget(mut self, budget: InputBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn engine(&self, strategy: SchedulingStrategy) -> ExecutionEngine {
        let capabilities = Capabilities::new(
            StubGenerator {
                behaviors: self.behaviors.clone(),
                delays: self.delays.clone(),
                log: self.log.clone(),
            },
            StubTranscripts {
                result: self.transcript.clone(),
                log: self.log.clone(),
            },
            StubSearch {
                result: self.search.clone(),
                delay: self.search_delay,
                log: self.log.clone(),
            },
        );

        let executor = StageExecutor::new(capabilities)
            .with_prompts(tagged_prompts())
            .with_budget(self.budget.clone())
            .with_timeout(self.timeout);
        ExecutionEngine::new(executor, strategy)
    }

    /// Run with the parallel strategy
    pub async fn run(&self) -> RunReport {
        self.engine(SchedulingStrategy::Parallel).run(VIDEO_URL).await
    }

    /// Run and capture every emitted event
    pub async fn run_with_events(&self) -> (RunReport, Vec<ExecutionEvent>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let mut engine = self.engine(SchedulingStrategy::Parallel);
        engine.add_event_handler(move |event| sink.lock().unwrap().push(event));

        let report = engine.run(VIDEO_URL).await;
        let events = events.lock().unwrap().clone();
        (report, events)
    }
}

pub fn assert_stage_completed(report: &RunReport, stage: StageId) {
    assert!(
        matches!(report.stage_state(stage), Some(StageState::Completed { .. })),
        "Stage {} should have completed, got {:?}",
        stage,
        report.stage_state(stage)
    );
}

pub fn assert_stage_skipped(report: &RunReport, stage: StageId) {
    assert!(
        matches!(report.stage_state(stage), Some(StageState::Skipped { .. })),
        "Stage {} should have been skipped, got {:?}",
        stage,
        report.stage_state(stage)
    );
}

pub fn failed_stages(report: &RunReport) -> Vec<StageId> {
    report.errors.iter().map(|failure| failure.stage).collect()
}
