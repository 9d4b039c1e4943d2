//! CLI output formatting

use crate::{
    core::{ExecutionStatus, RunReport, StageGraph},
    execution::ExecutionEvent,
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Write as _;
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a progress bar
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    let bar_style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    progress.set_style(bar_style);
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Format an execution status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Completed => style("COMPLETED").green().to_string(),
        ExecutionStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::RunStarted { run_id, video_url } => format!(
            "{} Digesting {} ({})",
            ROCKET,
            style(video_url).bold(),
            style(&run_id.to_string()[..8]).dim()
        ),
        ExecutionEvent::StageStarted { stage } => {
            format!("{} {}", SPINNER, style(stage).cyan())
        }
        ExecutionEvent::StageCompleted { stage, fields } => {
            let written = fields
                .iter()
                .map(|f| f.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "{} {} → {}",
                CHECK,
                style(stage).green(),
                style(written).dim()
            )
        }
        ExecutionEvent::StageFailed { stage, error } => {
            format!("{} {}: {}", CROSS, style(stage).red(), style(error).dim())
        }
        ExecutionEvent::StageSkipped { stage, reason } => {
            format!("{} {} ({})", SKIP, style(stage).dim(), reason)
        }
        ExecutionEvent::RunCompleted { run_id, status } => format!(
            "{} Run ({}) {}",
            INFO,
            style(&run_id.to_string()[..8]).dim(),
            format_status(*status)
        ),
    }
}

/// Horizontal rule spanning the terminal
pub fn separator() -> String {
    let width = term_size::dimensions_stdout()
        .map(|(w, _)| w)
        .unwrap_or(80);
    "─".repeat(width)
}

/// Render the digest and any stage errors
pub fn format_report(report: &RunReport) -> String {
    let state = &report.state;
    let keywords = state.keyword.as_ref().map(|k| k.join(", "));

    let sections = [
        ("Video", state.video_id.as_deref()),
        ("Summary", state.summary.as_deref()),
        ("Questions", state.questions.as_deref()),
        ("Next steps", state.next_steps.as_deref()),
        ("Keywords", keywords.as_deref()),
        ("Related videos", state.video_suggestions.as_deref()),
    ];

    let rule = separator();
    let mut out = String::new();
    for (title, body) in sections {
        let Some(body) = body else { continue };
        let _ = writeln!(out, "{}", style(&rule).dim());
        let _ = writeln!(out, "{}\n", style(title).bold());
        let _ = writeln!(out, "{}", body.trim_end());
    }

    if !report.errors.is_empty() {
        let _ = writeln!(out, "{}", style(&rule).dim());
        let _ = writeln!(out, "{}\n", style("Errors").red().bold());
        for failure in &report.errors {
            let _ = writeln!(out, "{} {}", CROSS, failure);
        }
    }

    let _ = writeln!(out, "{}", style(&rule).dim());
    let _ = write!(
        out,
        "{} in {:.1}s",
        format_status(report.status),
        report.duration().as_secs_f64()
    );
    out
}

/// Render the stage topology in execution order
pub fn format_graph(graph: &StageGraph) -> String {
    let mut out = String::new();
    for (position, stage) in graph.execution_order().iter().enumerate() {
        let spec = stage.spec();
        let reads = spec.reads.iter().map(|f| f.as_str()).collect::<Vec<_>>();
        let writes = spec.writes.iter().map(|f| f.as_str()).collect::<Vec<_>>();
        let after = graph
            .dependencies(*stage)
            .iter()
            .map(|d| d.as_str())
            .collect::<Vec<_>>();

        let _ = writeln!(
            out,
            "{}. {}  {}",
            position + 1,
            style(stage).bold(),
            style(spec.description).dim()
        );
        let _ = writeln!(out, "     reads:  {}", reads.join(", "));
        let _ = writeln!(out, "     writes: {}", writes.join(", "));
        if !after.is_empty() {
            let _ = writeln!(out, "     after:  {}", after.join(", "));
        }
    }
    out
}
