//! Digest pipeline execution

pub mod engine;
pub mod executor;
pub mod prompts;
pub mod scheduler;
pub mod stages;

pub use engine::{EventHandler, ExecutionEngine, ExecutionEvent};
pub use executor::StageExecutor;
pub use prompts::Prompts;
pub use scheduler::{ExecutionScheduler, SchedulingStrategy};
