//! Core domain models for the digest pipeline
//!
//! This module defines the pipeline state record, the stage contracts and
//! the graph derived from them, plus settings and the run report.

pub mod budget;
pub mod config;
pub mod error;
pub mod graph;
pub mod report;
pub mod stage;
pub mod state;
pub mod status;

pub use budget::{BudgetPolicy, InputBudget, TokenCounter};
pub use error::{StageError, StageFailure, StateConflict};
pub use graph::{GraphError, StageGraph};
pub use report::RunReport;
pub use stage::{StageId, StageSpec, TOPOLOGY};
pub use state::{Field, PipelineState, StateUpdate};
pub use status::{ExecutionStatus, StageState};
