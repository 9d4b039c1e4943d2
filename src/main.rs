use anyhow::{Context, Result};
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use video_digest::cli::commands::{ConfigCommand, GraphCommand, RunCommand};
use video_digest::cli::output::*;
use video_digest::cli::{Cli, Command};
use video_digest::core::{config::Settings, StageGraph};
use video_digest::execution::{ExecutionEngine, ExecutionEvent};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::from_args();

    let settings =
        Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    init_logging(&settings, cli.verbose)?;
    debug!("Effective settings: {:?}", settings);

    match &cli.command {
        Command::Run(cmd) => run_digest(cmd, settings).await?,
        Command::Graph(cmd) => show_graph(cmd)?,
        Command::Config(cmd) => show_config(cmd, &settings)?,
    }

    Ok(())
}

/// RUST_LOG wins, then --verbose, then the configured level
fn init_logging(settings: &Settings, verbose: bool) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if verbose => EnvFilter::new("debug"),
        Err(_) => EnvFilter::try_new(&settings.log_level)
            .with_context(|| format!("Invalid log level '{}'", settings.log_level))?,
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;
    Ok(())
}

async fn run_digest(cmd: &RunCommand, mut settings: Settings) -> Result<()> {
    cmd.apply_to(&mut settings)
        .context("Invalid command-line overrides")?;

    let mut engine =
        ExecutionEngine::from_settings(&settings).context("Failed to set up capabilities")?;

    debug!("Scheduling with {:?}", engine.strategy());

    let progress = (!cmd.json).then(|| create_progress_bar(engine.graph().len()));
    if let Some(progress) = progress.clone() {
        engine.add_event_handler(move |event| {
            progress.println(format_execution_event(&event));
            if matches!(
                event,
                ExecutionEvent::StageCompleted { .. }
                    | ExecutionEvent::StageFailed { .. }
                    | ExecutionEvent::StageSkipped { .. }
            ) {
                progress.inc(1);
            }
        });
    }

    let report = engine.run(&cmd.url).await;

    if let Some(progress) = progress {
        progress.finish_and_clear();
    }

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("\n{}", format_report(&report));
    }

    if !report.is_success() {
        std::process::exit(1);
    }

    Ok(())
}

fn show_graph(cmd: &GraphCommand) -> Result<()> {
    let graph = StageGraph::digest();
    graph.validate().context("Stage graph is invalid")?;

    if cmd.json {
        let stages: Vec<_> = graph
            .execution_order()
            .iter()
            .map(|stage| {
                let spec = stage.spec();
                serde_json::json!({
                    "stage": stage,
                    "reads": spec.reads,
                    "writes": spec.writes,
                    "after": graph.dependencies(*stage),
                    "description": spec.description,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&stages)?);
    } else {
        println!("{} Stage graph ({} stages)\n", INFO, graph.len());
        print!("{}", format_graph(&graph));
    }

    Ok(())
}

fn show_config(cmd: &ConfigCommand, settings: &Settings) -> Result<()> {
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(settings)?);
    } else {
        if let Some(path) = Settings::default_path() {
            println!(
                "{} Default settings file: {}",
                INFO,
                style(path.display()).dim()
            );
        }
        print!("{}", serde_yaml::to_string(settings)?);
    }
    Ok(())
}
