use std::sync::Arc;
use std::time::Duration;

use vision_buddy_model::{ModelProvider, ToolCallRequest};

use super::{Agent, ToolCallFn};
use crate::model_client::{ModelClient, TranscriptFn};
use crate::tool::{Dispatcher, Registry};

const DEFAULT_MAX_ROUND_TRIPS: usize = 8;
const DEFAULT_MAX_RETRIES: usize = 2;
const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(500);

/// [`Agent`] builder.
pub struct AgentBuilder {
    model_client: ModelClient,
    registry: Arc<Registry>,
    system_prompt: Option<String>,
    max_round_trips: usize,
    max_retries: usize,
    retry_interval: Duration,
    model_timeout: Option<Duration>,
    tool_timeout: Option<Duration>,
    on_transcript: Option<TranscriptFn>,
    on_tool_call: Option<ToolCallFn>,
}

impl AgentBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            registry: Default::default(),
            system_prompt: None,
            max_round_trips: DEFAULT_MAX_ROUND_TRIPS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            model_timeout: None,
            tool_timeout: None,
            on_transcript: None,
            on_tool_call: None,
        }
    }

    /// Sets the tools the model may call. Defaults to none.
    #[inline]
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the system instruction sent ahead of every request.
    #[inline]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets how many times the model may be called in one turn, at least
    /// one. Defaults to 8.
    #[inline]
    pub fn with_max_round_trips(mut self, max_round_trips: usize) -> Self {
        self.max_round_trips = max_round_trips.max(1);
        self
    }

    /// Sets how many times a rate limited model request is retried.
    /// Defaults to 2.
    #[inline]
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the delay before the first retry, later retries back off
    /// exponentially. Defaults to 500ms.
    #[inline]
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Sets a time limit for every model request.
    #[inline]
    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = Some(timeout);
        self
    }

    /// Sets a time limit for every tool invocation.
    #[inline]
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = Some(timeout);
        self
    }

    /// Attaches a callback receiving the assistant text as it streams in.
    #[inline]
    pub fn on_transcript(
        mut self,
        on_transcript: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.on_transcript = Some(Arc::new(on_transcript));
        self
    }

    /// Attaches a callback invoked with each tool call before it runs.
    #[inline]
    pub fn on_tool_call(
        mut self,
        on_tool_call: impl Fn(&ToolCallRequest) + Send + Sync + 'static,
    ) -> Self {
        self.on_tool_call = Some(Arc::new(on_tool_call));
        self
    }

    /// Builds the agent.
    pub fn build(self) -> Agent {
        let tool_definitions = self.registry.definitions();
        debug!(
            "building an agent with tools: {:?}",
            self.registry.names().collect::<Vec<_>>()
        );
        let dispatcher = Dispatcher::new(self.registry)
            .with_tool_timeout(self.tool_timeout);
        Agent {
            model_client: self.model_client,
            dispatcher,
            system_prompt: self.system_prompt,
            tool_definitions,
            max_round_trips: self.max_round_trips,
            max_retries: self.max_retries,
            retry_interval: self.retry_interval,
            model_timeout: self.model_timeout,
            on_transcript: self.on_transcript,
            on_tool_call: self.on_tool_call,
        }
    }
}
