//! Shared test helpers and scripted in-memory services.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use agentrun::config::OrchestratorConfig;
use agentrun::error::RunError;
use agentrun::orchestrator::RunOrchestrator;
use agentrun::service::{AgentAdministration, MessageService, RunService, UpdateStream};
use agentrun::tools::{FunctionTool, ToolExecutionContext, ToolParameters, ToolRegistry};
use agentrun::types::*;

pub const THREAD_ID: &str = "thread_1";
pub const AGENT_ID: &str = "asst_1";
pub const RUN_ID: &str = "run_1";

/// Snapshot of the test run with the given status.
pub fn run(status: RunStatus) -> Run {
    Run::new(RUN_ID, THREAD_ID, AGENT_ID, status)
}

/// `requires_action` snapshot asking for the given `(call id, function, arguments)`.
pub fn requires(calls: &[(&str, &str, &str)]) -> Run {
    run(RunStatus::InProgress).with_required_calls(
        calls
            .iter()
            .map(|(id, name, args)| RequiredToolCall::function(*id, *name, *args))
            .collect(),
    )
}

pub fn fast_config() -> OrchestratorConfig {
    OrchestratorConfig::default()
        .with_poll_interval(Duration::from_millis(500))
        .with_request_timeout(Duration::from_secs(5))
        .with_max_wait(Duration::from_secs(60))
        .with_stream_idle_timeout(Duration::from_secs(10))
}

pub fn orchestrator(
    runs: Arc<ScriptedRuns>,
    messages: Arc<ScriptedMessages>,
    config: OrchestratorConfig,
) -> RunOrchestrator {
    RunOrchestrator::new(runs, messages, config)
}

enum StreamScript {
    Finite(Vec<Result<StreamUpdate, RunError>>),
    /// Emits the updates, then never ends.
    Hanging(Vec<Result<StreamUpdate, RunError>>),
}

/// A run service that replays scripted snapshots and streams.
///
/// `get_run` pops the next scripted snapshot and repeats the latest one once
/// the script runs out, like a remote run that stopped changing.
pub struct ScriptedRuns {
    created: Run,
    latest: Mutex<Run>,
    polls: Mutex<VecDeque<Run>>,
    after_submit: Mutex<VecDeque<Run>>,
    streams: Mutex<VecDeque<StreamScript>>,
    submissions: Mutex<Vec<Vec<ToolOutput>>>,
    get_calls: AtomicUsize,
    streams_opened: AtomicUsize,
    cancel_calls: AtomicUsize,
    hang_create: AtomicBool,
    hang_get: AtomicBool,
}

impl ScriptedRuns {
    pub fn new(created: Run) -> Self {
        Self {
            latest: Mutex::new(created.clone()),
            created,
            polls: Mutex::new(VecDeque::new()),
            after_submit: Mutex::new(VecDeque::new()),
            streams: Mutex::new(VecDeque::new()),
            submissions: Mutex::new(Vec::new()),
            get_calls: AtomicUsize::new(0),
            streams_opened: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
            hang_create: AtomicBool::new(false),
            hang_get: AtomicBool::new(false),
        }
    }

    /// Run creation, polled or streamed, never answers.
    pub fn with_hanging_create(self) -> Self {
        self.hang_create.store(true, Ordering::SeqCst);
        self
    }

    /// `get_run` never answers.
    pub fn with_hanging_get(self) -> Self {
        self.hang_get.store(true, Ordering::SeqCst);
        self
    }

    pub fn then_poll(self, snapshot: Run) -> Self {
        self.polls.lock().unwrap().push_back(snapshot);
        self
    }

    pub fn then_after_submit(self, snapshot: Run) -> Self {
        self.after_submit.lock().unwrap().push_back(snapshot);
        self
    }

    pub fn with_stream(self, updates: Vec<StreamUpdate>) -> Self {
        self.with_stream_items(updates.into_iter().map(Ok).collect())
    }

    pub fn with_stream_items(self, items: Vec<Result<StreamUpdate, RunError>>) -> Self {
        self.streams
            .lock()
            .unwrap()
            .push_back(StreamScript::Finite(items));
        self
    }

    pub fn with_hanging_stream(self, updates: Vec<StreamUpdate>) -> Self {
        self.streams
            .lock()
            .unwrap()
            .push_back(StreamScript::Hanging(updates.into_iter().map(Ok).collect()));
        self
    }

    pub fn submissions(&self) -> Vec<Vec<ToolOutput>> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn streams_opened(&self) -> usize {
        self.streams_opened.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    fn record_submission(&self, outputs: &[ToolOutput]) {
        self.submissions.lock().unwrap().push(outputs.to_vec());
    }

    fn next_stream(&self) -> Result<UpdateStream, RunError> {
        self.streams_opened.fetch_add(1, Ordering::SeqCst);
        match self.streams.lock().unwrap().pop_front() {
            Some(StreamScript::Finite(items)) => Ok(stream::iter(items).boxed()),
            Some(StreamScript::Hanging(items)) => {
                Ok(stream::iter(items).chain(stream::pending()).boxed())
            }
            None => Err(RunError::api(500, "no stream scripted")),
        }
    }
}

#[async_trait]
impl RunService for ScriptedRuns {
    async fn create_run(&self, thread_id: &str, options: &RunOptions) -> Result<Run, RunError> {
        assert_eq!(thread_id, THREAD_ID);
        assert_eq!(options.agent_id, AGENT_ID);
        hang_if(&self.hang_create).await;
        Ok(self.created.clone())
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, RunError> {
        assert_eq!(thread_id, THREAD_ID);
        assert_eq!(run_id, RUN_ID);
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        hang_if(&self.hang_get).await;
        let mut latest = self.latest.lock().unwrap();
        if let Some(next) = self.polls.lock().unwrap().pop_front() {
            *latest = next;
        }
        Ok(latest.clone())
    }

    async fn submit_tool_outputs(
        &self,
        _thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run, RunError> {
        assert_eq!(run_id, RUN_ID);
        self.record_submission(outputs);
        let next = self
            .after_submit
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| run(RunStatus::Queued));
        *self.latest.lock().unwrap() = next.clone();
        Ok(next)
    }

    async fn create_run_stream(
        &self,
        thread_id: &str,
        options: &RunOptions,
    ) -> Result<UpdateStream, RunError> {
        assert_eq!(thread_id, THREAD_ID);
        assert_eq!(options.agent_id, AGENT_ID);
        hang_if(&self.hang_create).await;
        self.next_stream()
    }

    async fn submit_tool_outputs_stream(
        &self,
        _thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<UpdateStream, RunError> {
        assert_eq!(run_id, RUN_ID);
        self.record_submission(outputs);
        self.next_stream()
    }

    async fn cancel_run(&self, _thread_id: &str, _run_id: &str) -> Result<Run, RunError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        Ok(run(RunStatus::Cancelling))
    }
}

async fn hang_if(flag: &AtomicBool) {
    if flag.load(Ordering::SeqCst) {
        std::future::pending::<()>().await;
    }
}

/// Registry whose `getUserFavoriteCity` takes `delay` to answer.
pub fn slow_registry(delay: Duration) -> ToolRegistry {
    ToolRegistry::new().with_tool(Arc::new(FunctionTool::new(
        "getUserFavoriteCity",
        "Gets the user's favorite city, slowly.",
        ToolParameters::empty(),
        move |_args, _ctx: ToolExecutionContext| async move {
            tokio::time::sleep(delay).await;
            Ok(serde_json::json!("Seattle, WA"))
        },
    )))
}

/// Serves a fixed message list.
#[derive(Default)]
pub struct ScriptedMessages {
    messages: Vec<Message>,
    list_calls: AtomicUsize,
}

impl ScriptedMessages {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageService for ScriptedMessages {
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<Message>, RunError> {
        assert_eq!(thread_id, THREAD_ID);
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.messages.clone())
    }
}

/// Records deletions, optionally failing them.
#[derive(Default)]
pub struct RecordingAdmin {
    pub fail_thread: bool,
    pub fail_agent: bool,
    deleted: Mutex<Vec<String>>,
}

impl RecordingAdmin {
    pub fn failing(fail_thread: bool, fail_agent: bool) -> Self {
        Self {
            fail_thread,
            fail_agent,
            ..Self::default()
        }
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentAdministration for RecordingAdmin {
    async fn delete_thread(&self, thread_id: &str) -> Result<(), RunError> {
        self.deleted.lock().unwrap().push(format!("thread:{thread_id}"));
        if self.fail_thread {
            return Err(RunError::api(404, "No thread found"));
        }
        Ok(())
    }

    async fn delete_agent(&self, agent_id: &str) -> Result<(), RunError> {
        self.deleted.lock().unwrap().push(format!("agent:{agent_id}"));
        if self.fail_agent {
            return Err(RunError::api(500, "agent deletion failed"));
        }
        Ok(())
    }
}

/// A conversation as it would look after the favorite-city run.
pub fn favorite_city_messages() -> Vec<Message> {
    let question = Message::text_message(
        "msg_1",
        THREAD_ID,
        MessageRole::User,
        "What's the weather like in my favorite city?",
    );
    let mut answer = Message::text_message(
        "msg_2",
        THREAD_ID,
        MessageRole::Agent,
        "Your favorite city is Seattle, WA.",
    );
    answer.run_id = Some(RUN_ID.to_string());
    answer.agent_id = Some(AGENT_ID.to_string());
    vec![question, answer]
}
