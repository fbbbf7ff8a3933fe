//! HTTP implementation of the run, message and administration services.

pub mod http;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::RunError;
use crate::service::{AgentAdministration, MessageService, RunService, UpdateStream};
use crate::stream::decode_byte_stream;
use crate::types::{Message, Run, RunOptions, ToolOutput};

use self::http::{check_status, request_headers, shared_client};

const MESSAGE_PAGE_LIMIT: u32 = 100;

/// REST client for threads, runs and messages.
#[derive(Debug, Clone)]
pub struct AgentsClient {
    config: ClientConfig,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct MessagePage {
    data: Vec<Message>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    last_id: Option<String>,
}

impl AgentsClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_http_client(config, shared_client().clone())
    }

    pub fn with_http_client(config: ClientConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    /// Build from the config file and `AGENTRUN_*` environment variables.
    pub fn from_env() -> Result<Self, RunError> {
        Ok(Self::new(ClientConfig::load(None)?))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str, streaming: bool) -> RequestBuilder {
        let url = format!("{}/{}", self.config.endpoint, path);
        self.http
            .request(method, url)
            .headers(request_headers(&self.config.api_key, streaming))
            .query(&[("api-version", self.config.api_version.as_str())])
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, RunError> {
        let resp = check_status(builder.send().await?).await?;
        Ok(resp.json().await?)
    }

    async fn open_stream(&self, builder: RequestBuilder) -> Result<UpdateStream, RunError> {
        let resp = check_status(builder.send().await?).await?;
        Ok(decode_byte_stream(resp.bytes_stream()))
    }

    fn create_run_body(options: &RunOptions, stream: bool) -> Result<serde_json::Value, RunError> {
        let mut body = serde_json::to_value(options)?;
        if let Some(object) = body.as_object_mut() {
            object.insert("stream".to_string(), serde_json::Value::Bool(stream));
        }
        Ok(body)
    }

    fn submit_body(outputs: &[ToolOutput], stream: bool) -> serde_json::Value {
        serde_json::json!({ "tool_outputs": outputs, "stream": stream })
    }
}

#[async_trait]
impl RunService for AgentsClient {
    async fn create_run(&self, thread_id: &str, options: &RunOptions) -> Result<Run, RunError> {
        debug!(thread_id, agent_id = %options.agent_id, "create_run");
        let body = Self::create_run_body(options, false)?;
        self.send_json(
            self.request(Method::POST, &format!("threads/{thread_id}/runs"), false)
                .json(&body),
        )
        .await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, RunError> {
        self.send_json(self.request(
            Method::GET,
            &format!("threads/{thread_id}/runs/{run_id}"),
            false,
        ))
        .await
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run, RunError> {
        debug!(thread_id, run_id, outputs = outputs.len(), "submit_tool_outputs");
        self.send_json(
            self.request(
                Method::POST,
                &format!("threads/{thread_id}/runs/{run_id}/submit_tool_outputs"),
                false,
            )
            .json(&Self::submit_body(outputs, false)),
        )
        .await
    }

    async fn create_run_stream(
        &self,
        thread_id: &str,
        options: &RunOptions,
    ) -> Result<UpdateStream, RunError> {
        debug!(thread_id, agent_id = %options.agent_id, "create_run_stream");
        let body = Self::create_run_body(options, true)?;
        self.open_stream(
            self.request(Method::POST, &format!("threads/{thread_id}/runs"), true)
                .json(&body),
        )
        .await
    }

    async fn submit_tool_outputs_stream(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<UpdateStream, RunError> {
        debug!(thread_id, run_id, outputs = outputs.len(), "submit_tool_outputs_stream");
        self.open_stream(
            self.request(
                Method::POST,
                &format!("threads/{thread_id}/runs/{run_id}/submit_tool_outputs"),
                true,
            )
            .json(&Self::submit_body(outputs, true)),
        )
        .await
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, RunError> {
        debug!(thread_id, run_id, "cancel_run");
        self.send_json(self.request(
            Method::POST,
            &format!("threads/{thread_id}/runs/{run_id}/cancel"),
            false,
        ))
        .await
    }
}

#[async_trait]
impl MessageService for AgentsClient {
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<Message>, RunError> {
        let mut messages = Vec::new();
        let mut after: Option<String> = None;
        let limit = MESSAGE_PAGE_LIMIT.to_string();

        loop {
            let mut builder = self
                .request(Method::GET, &format!("threads/{thread_id}/messages"), false)
                .query(&[("order", "asc"), ("limit", limit.as_str())]);
            if let Some(cursor) = &after {
                builder = builder.query(&[("after", cursor.as_str())]);
            }

            let page: MessagePage = self.send_json(builder).await?;
            messages.extend(page.data);
            match (page.has_more, page.last_id) {
                (true, Some(last_id)) => after = Some(last_id),
                _ => break,
            }
        }

        Ok(messages)
    }
}

#[async_trait]
impl AgentAdministration for AgentsClient {
    async fn delete_thread(&self, thread_id: &str) -> Result<(), RunError> {
        debug!(thread_id, "delete_thread");
        let req = self.request(Method::DELETE, &format!("threads/{thread_id}"), false);
        check_status(req.send().await?).await?;
        Ok(())
    }

    async fn delete_agent(&self, agent_id: &str) -> Result<(), RunError> {
        debug!(agent_id, "delete_agent");
        let req = self.request(Method::DELETE, &format!("assistants/{agent_id}"), false);
        check_status(req.send().await?).await?;
        Ok(())
    }
}
