//! agentrun CLI binary entry point.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

use agentrun::cli::{Cli, Commands, MessagesArgs, RunArgs};
use agentrun::client::AgentsClient;
use agentrun::config::{ClientConfig, OrchestratorConfig};
use agentrun::orchestrator::{RunOrchestrator, RunRequest};
use agentrun::tools::builtin::sample_registry;
use agentrun::types::{DeltaContent, Message, RunOptions, StreamUpdate};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Run(args) => handle_run(args, config_path).await,
        Commands::Messages(args) => handle_messages(args, config_path).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn orchestrator(config_path: Option<&Path>) -> Result<RunOrchestrator, Box<dyn std::error::Error>> {
    let client = AgentsClient::new(ClientConfig::load(config_path)?);
    Ok(RunOrchestrator::from_client(client, OrchestratorConfig::load(config_path)?))
}

async fn handle_run(args: RunArgs, config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let orchestrator = orchestrator(config_path)?;
    let mut options = RunOptions::new(args.agent);
    options.instructions = args.instructions;
    let request = RunRequest::new(args.thread.clone(), options);

    let cancel = request.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    if !args.stream {
        let tools = sample_registry();
        let outcome = orchestrator.run_to_completion(request, &tools).await?;
        eprintln!("run {} {}", outcome.run.id, outcome.run.status);
        print_messages(&outcome.messages);
        return Ok(());
    }

    let mut stream = orchestrator.run_streaming(request, Arc::new(sample_registry()));
    let mut stdout = std::io::stdout();
    while let Some(update) = stream.next().await {
        match update? {
            StreamUpdate::MessageDelta(delta) => {
                for block in &delta.delta.content {
                    if let DeltaContent::Text { text } = &block.content {
                        print!("{}", text.value);
                    }
                }
                let _ = stdout.flush();
            }
            StreamUpdate::RequiredAction(run) => {
                let calls = run.required_tool_calls().unwrap_or_default();
                eprintln!("\n⚡ {} tool call(s) for run {}", calls.len(), run.id);
            }
            StreamUpdate::RunCreated(run) | StreamUpdate::RunStatusChanged(run) => {
                tracing::info!(run_id = %run.id, status = %run.status, "run update");
            }
            StreamUpdate::Error(error) => eprintln!("\n❌ {}", error.message),
        }
    }
    println!();

    Ok(())
}

async fn handle_messages(
    args: MessagesArgs,
    config_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let orchestrator = orchestrator(config_path)?;
    let messages = orchestrator.messages(&args.thread).await?;
    print_messages(&messages);
    Ok(())
}

fn print_messages(messages: &[Message]) {
    for message in messages {
        println!("{}: {}", message.role, message.text());
    }
}
