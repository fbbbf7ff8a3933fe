//! Command-line interface for driving runs by hand.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// agentrun CLI
#[derive(Parser, Debug)]
#[command(name = "agentrun", version, about = "Drive hosted agent runs from the terminal")]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a run on a thread and follow it to the end
    Run(RunArgs),
    /// List the messages of a thread
    Messages(MessagesArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Thread to run on
    #[arg(long)]
    pub thread: String,

    /// Agent that executes the run
    #[arg(long)]
    pub agent: String,

    /// Follow the run through its update stream instead of polling
    #[arg(long)]
    pub stream: bool,

    /// Override the agent's instructions for this run
    #[arg(long)]
    pub instructions: Option<String>,
}

/// Arguments for the `messages` subcommand.
#[derive(Parser, Debug)]
pub struct MessagesArgs {
    /// Thread to list
    #[arg(long)]
    pub thread: String,
}
