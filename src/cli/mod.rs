//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{ConfigCommand, GraphCommand, RunCommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// Digest a YouTube video into a summary, study questions and follow-ups
#[derive(Debug, Parser, Clone)]
#[command(name = "video-digest")]
#[command(version)]
#[command(
    about = "Digest a YouTube video: summary, questions, next steps and related videos",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the settings file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Digest a video
    Run(RunCommand),

    /// Show the stage graph and execution order
    Graph(GraphCommand),

    /// Show the effective settings
    Config(ConfigCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
