//! video-digest - turn a YouTube video into a study digest
//!
//! A fixed graph of stages extracts the video id, fetches the transcript,
//! summarizes it, writes comprehension questions and next steps, and looks
//! up related videos. Independent branches run concurrently; a failed stage
//! skips only its descendants.

pub mod capability;
pub mod cli;
pub mod core;
pub mod execution;

// Re-export commonly used types
pub use crate::capability::{
    Capabilities, CapabilityError, TextGenerator, TranscriptSource, VideoSearch,
};
pub use crate::core::{
    ExecutionStatus, Field, PipelineState, RunReport, StageError, StageFailure, StageId,
    StageState, StateUpdate,
};
pub use crate::core::config::Settings;
pub use crate::execution::{ExecutionEngine, ExecutionEvent, SchedulingStrategy, StageExecutor};
