use std::path::Path;
use std::sync::Arc;

use reqwest::Client;
use vision_buddy_core::conversation::Conversation;
use vision_buddy_core::tool::{
    DocumentIndex, DocumentIndexTool, Registry, RegistryError,
};
use vision_buddy_core::{Agent, AgentBuilder, AgentError};
use vision_buddy_model::{ModelProvider, ToolCallRequest};

use crate::index::LexicalIndex;
use crate::tools::*;

/// The instructions the assistant runs with unless overridden.
pub const DEFAULT_SYSTEM_PROMPT: &str = include_str!("./system_prompt.md");

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    agent_builder: AgentBuilder,
    system_prompt: String,
    index: Option<Arc<dyn DocumentIndex>>,
    http_client: Option<Client>,
}

impl SessionBuilder {
    /// Creates a session builder with a specified model provider.
    pub fn with_model_provider<M: ModelProvider + 'static>(
        provider: M,
    ) -> Self {
        let agent_builder = AgentBuilder::with_model_provider(provider);
        Self {
            agent_builder,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
            index: None,
            http_client: None,
        }
    }

    /// Sets the system prompt for the agent.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Sets the index behind `retriever_tool`. Without one the tool finds
    /// nothing.
    #[inline]
    pub fn with_document_index(
        mut self,
        index: Arc<dyn DocumentIndex>,
    ) -> Self {
        self.index = Some(index);
        self
    }

    /// Sets the HTTP client shared by the web tools.
    #[inline]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets how many model calls one message may take.
    #[inline]
    pub fn with_max_round_trips(mut self, max_round_trips: usize) -> Self {
        self.agent_builder =
            self.agent_builder.with_max_round_trips(max_round_trips);
        self
    }

    /// Attaches a callback to be invoked when a transcript is generated.
    #[inline]
    pub fn on_transcript(
        mut self,
        on_transcript: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.agent_builder = self.agent_builder.on_transcript(on_transcript);
        self
    }

    /// Attaches a callback to be invoked before each tool call runs.
    #[inline]
    pub fn on_tool_call(
        mut self,
        on_tool_call: impl Fn(&ToolCallRequest) + Send + Sync + 'static,
    ) -> Self {
        self.agent_builder = self.agent_builder.on_tool_call(on_tool_call);
        self
    }

    /// Builds a new session with the five built-in tools.
    pub fn build(self) -> Result<Session, RegistryError> {
        let index = self
            .index
            .unwrap_or_else(|| Arc::new(LexicalIndex::default()));
        let client = self.http_client.unwrap_or_default();

        let registry = Registry::builder()
            .with_tool(DocumentIndexTool::new(index))?
            .with_tool(SearchTool::new(client.clone()))?
            .with_tool(MedicalNewsTool::new(client.clone()))?
            .with_tool(WhoDiseaseInfoTool::new(client))?
            .with_tool(TodayTool::new())?
            .build();

        let agent = self
            .agent_builder
            .with_system_prompt(self.system_prompt)
            .with_registry(Arc::new(registry))
            .build();

        Ok(Session {
            agent,
            conversation: Conversation::new(),
        })
    }
}

/// A chat session, like a window that displays messages and has a input box.
///
/// The session owns the conversation and hands it to the agent one message
/// at a time. A failed message leaves the conversation as it was.
pub struct Session {
    agent: Agent,
    conversation: Conversation,
}

impl Session {
    /// Sends a message and returns the assistant's answer.
    pub async fn send_message(
        &mut self,
        message: &str,
    ) -> Result<String, AgentError> {
        let turn = self.agent.submit(message, &self.conversation).await?;
        self.conversation = turn.conversation;
        Ok(turn.answer)
    }

    /// Returns the conversation so far.
    #[inline]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Forgets the conversation.
    #[inline]
    pub fn reset(&mut self) {
        self.conversation.clear();
    }

    /// Writes the conversation to `path` as `You: `/`AI: ` lines,
    /// replacing any existing file.
    pub fn save_transcript<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> std::io::Result<()> {
        std::fs::write(path, self.conversation.transcript())
    }
}
