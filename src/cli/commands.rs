//! CLI command definitions

use crate::core::config::{Settings, StrategySetting};
use clap::Args;

/// Digest a video
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Video URL
    pub url: String,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,

    /// Scheduling strategy, overrides the settings file
    #[arg(long, value_enum)]
    pub strategy: Option<SchedulingStrategyArg>,

    /// Concurrency cap for `parallel-limited`
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Per-call timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl RunCommand {
    /// Layer the command-line overrides onto the settings
    pub fn apply_to(&self, settings: &mut Settings) -> anyhow::Result<()> {
        if let Some(strategy) = self.strategy {
            settings.execution.strategy = strategy.into();
        }
        if let Some(max) = self.max_concurrency {
            settings.execution.max_concurrency = max;
        }
        if let Some(secs) = self.timeout {
            settings.execution.call_timeout_secs = secs;
        }
        settings.validate()
    }
}

/// Show the stage graph
#[derive(Debug, Args, Clone)]
pub struct GraphCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show the effective settings
#[derive(Debug, Args, Clone)]
pub struct ConfigCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Scheduling strategy argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SchedulingStrategyArg {
    Sequential,
    Parallel,
    #[clap(name = "parallel-limited")]
    ParallelLimited,
}

impl From<SchedulingStrategyArg> for StrategySetting {
    fn from(arg: SchedulingStrategyArg) -> Self {
        match arg {
            SchedulingStrategyArg::Sequential => StrategySetting::Sequential,
            SchedulingStrategyArg::Parallel => StrategySetting::Parallel,
            SchedulingStrategyArg::ParallelLimited => StrategySetting::Limited,
        }
    }
}
