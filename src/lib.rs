//! agentrun: client-side orchestration of hosted agent runs.
//!
//! A run executes remotely against a thread. This crate follows it from
//! creation to a terminal status, either by polling or by consuming its
//! server-sent update streams, and answers the tool calls the remote agent
//! hands back with locally produced outputs.
//!
//! # Quick Start
//!
//! ```no_run
//! use agentrun::prelude::*;
//!
//! # async fn example() -> agentrun::error::Result<()> {
//! let client = AgentsClient::from_env()?;
//! let orchestrator = RunOrchestrator::from_client(client, OrchestratorConfig::load(None)?);
//! let tools = agentrun::tools::builtin::sample_registry();
//!
//! let request = RunRequest::new("thread_abc", RunOptions::new("asst_abc"));
//! let outcome = orchestrator.run_to_completion(request, &tools).await?;
//! println!("{}", outcome.reply_text().unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod blocking;
pub mod client;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod prelude;
pub mod service;
pub mod stream;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
