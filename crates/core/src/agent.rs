mod builder;
mod state;

use std::sync::Arc;
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use tracing::Instrument;
use vision_buddy_model::{
    AssistantMessage, ErrorKind, ModelMessage, ModelProvider, ModelRequest,
    ModelTool, ToolCallRequest,
};

use crate::conversation::Conversation;
use crate::model_client::{ModelClient, ModelClientResponse, TranscriptFn};
use crate::tool::Dispatcher;
pub use builder::AgentBuilder;
use state::LoopState;

/// The answer used when a turn runs out of round-trips before the model
/// wrote anything.
pub const ROUND_TRIP_LIMIT_NOTICE: &str =
    "I could not finish answering within the allowed number of steps.";

pub(crate) type ToolCallFn = Arc<dyn Fn(&ToolCallRequest) + Send + Sync>;

/// Errors that abort a turn.
///
/// Tool failures never show up here, they are recorded in the conversation
/// for the model to read.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    /// The model provider failed, after retries if the failure was
    /// transient.
    #[error("model request failed ({kind}): {message}")]
    Model {
        /// How the provider classified the failure.
        kind: ErrorKind,
        /// The provider's error message.
        message: String,
    },
    /// The model did not respond in time.
    #[error("model did not respond within {0:?}")]
    ModelTimeout(Duration),
}

impl AgentError {
    /// Returns `true` if retrying the same turn later may succeed.
    #[inline]
    pub fn is_transient(&self) -> bool {
        match self {
            AgentError::Model { kind, .. } => kind.is_transient(),
            AgentError::ModelTimeout(_) => true,
        }
    }

    // Only rate limiting is retried inside a turn, a timeout is left to the
    // caller.
    #[inline]
    fn is_retryable(&self) -> bool {
        matches!(self, AgentError::Model { kind, .. } if kind.is_transient())
    }
}

/// How a turn ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TurnFinish {
    /// The model answered without asking for more tools.
    Answered,
    /// The model was still asking for tools when the round-trip limit was
    /// reached.
    RoundTripLimitReached,
}

/// The outcome of [`Agent::submit`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentTurn {
    /// The text shown to the user.
    pub answer: String,
    /// The conversation with everything this turn appended.
    pub conversation: Conversation,
    /// How many times the model was called.
    pub round_trips: usize,
    /// How the turn ended.
    pub finish: TurnFinish,
}

/// An agent that answers user messages by alternating between the model and
/// the tools it asks for.
///
/// The agent itself holds no conversation. Each call to [`Agent::submit`]
/// takes the history from the caller and hands back the extended one, so a
/// single agent can serve any number of conversations one turn at a time.
pub struct Agent {
    model_client: ModelClient,
    dispatcher: Dispatcher,
    system_prompt: Option<String>,
    tool_definitions: Vec<ModelTool>,
    max_round_trips: usize,
    max_retries: usize,
    retry_interval: Duration,
    model_timeout: Option<Duration>,
    on_transcript: Option<TranscriptFn>,
    on_tool_call: Option<ToolCallFn>,
}

impl Agent {
    /// Creates an [`AgentBuilder`] with the specified model provider.
    #[inline]
    pub fn builder<P: ModelProvider + 'static>(provider: P) -> AgentBuilder {
        AgentBuilder::with_model_provider(provider)
    }

    /// Answers one user message.
    ///
    /// The turn works on a copy of `conversation`. On success the extended
    /// copy is returned in [`AgentTurn::conversation`]; on failure, or if the
    /// returned future is dropped, the caller's conversation is untouched and
    /// the same message can be submitted again.
    pub async fn submit(
        &self,
        input: impl Into<String>,
        conversation: &Conversation,
    ) -> Result<AgentTurn, AgentError> {
        let mut conversation = conversation.clone();
        conversation.push(ModelMessage::User(input.into()));
        let span = debug_span!("agent turn", history = conversation.len());
        self.run_turn(conversation).instrument(span).await
    }

    async fn run_turn(
        &self,
        mut conversation: Conversation,
    ) -> Result<AgentTurn, AgentError> {
        // Answers from earlier turns must not leak into this one.
        let turn_start = conversation.len();
        let mut state = LoopState::AwaitingModel;
        let mut round_trips = 0;

        let finish = loop {
            state = match state {
                LoopState::AwaitingModel => {
                    round_trips += 1;
                    let msg = self.call_model(&conversation).await?;
                    let next = LoopState::after_response(
                        &msg,
                        round_trips,
                        self.max_round_trips,
                    );
                    conversation.push(ModelMessage::Assistant(msg));
                    next
                }
                LoopState::AwaitingTools {
                    requests,
                    limit_reached,
                } => {
                    if let Some(on_tool_call) = &self.on_tool_call {
                        requests.iter().for_each(|req| on_tool_call(req));
                    }
                    debug!("dispatching {} tool calls", requests.len());
                    let results = self.dispatcher.execute(&requests).await;
                    conversation.extend(results.into_iter().map(ModelMessage::Tool));
                    LoopState::after_tools(limit_reached)
                }
                LoopState::Done(finish) => break finish,
            };
        };

        let answer = match finish {
            TurnFinish::Answered => conversation
                .last()
                .map(|msg| msg.content().to_owned())
                .unwrap_or_default(),
            TurnFinish::RoundTripLimitReached => {
                warn!("giving up after {round_trips} round-trips");
                conversation
                    .last_answer_since(turn_start)
                    .unwrap_or(ROUND_TRIP_LIMIT_NOTICE)
                    .to_owned()
            }
        };
        info!("turn finished after {round_trips} round-trips: {finish:?}");

        Ok(AgentTurn {
            answer,
            conversation,
            round_trips,
            finish,
        })
    }

    fn build_model_request(&self, conversation: &Conversation) -> ModelRequest {
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        if let Some(system_prompt) = &self.system_prompt {
            messages.push(ModelMessage::System(system_prompt.clone()));
        }
        messages.extend_from_slice(conversation.messages());
        ModelRequest {
            messages,
            tools: self.tool_definitions.clone(),
        }
    }

    async fn call_model(
        &self,
        conversation: &Conversation,
    ) -> Result<AssistantMessage, AgentError> {
        let request = self.build_model_request(conversation);
        let mut backoff = ExponentialBackoff {
            initial_interval: self.retry_interval,
            current_interval: self.retry_interval,
            max_elapsed_time: None,
            ..Default::default()
        };

        let mut retries = 0;
        loop {
            match self.send_request_once(request.clone()).await {
                Ok(resp) => return Ok(resp.into_message()),
                Err(err) if err.is_retryable() && retries < self.max_retries => {
                    retries += 1;
                    let delay =
                        backoff.next_backoff().unwrap_or(self.retry_interval);
                    warn!(
                        "{err}, retrying in {delay:?} ({retries}/{})",
                        self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    error!("{err}");
                    return Err(err);
                }
            }
        }
    }

    async fn send_request_once(
        &self,
        request: ModelRequest,
    ) -> Result<ModelClientResponse, AgentError> {
        let on_transcript = self
            .on_transcript
            .clone()
            .unwrap_or_else(|| Arc::new(|_: &str| {}));
        let fut = self.model_client.send_request(request, on_transcript);
        let result = match self.model_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| AgentError::ModelTimeout(limit))?,
            None => fut.await,
        };
        result.map_err(|err| AgentError::Model {
            kind: err.kind(),
            message: err.to_string(),
        })
    }
}
