use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::join_all;
use serde_json::{Map, Value};
use tracing::Instrument;
use vision_buddy_model::{ToolCallRequest, ToolCallResult};

use super::{Error, Registry, ToolObject, ToolResult};

/// Argument keys probed after the tool's primary argument.
pub const FALLBACK_ARGUMENT_KEYS: [&str; 3] = ["query", "topic", "disease"];

/// The tool result recorded when the model asks for an unknown tool.
pub const TOOL_NOT_FOUND_NOTICE: &str = "Tool not found.";

/// Picks the single string input of a tool out of the model's arguments.
///
/// The primary key of `signature` is tried first, then the keys in
/// [`FALLBACK_ARGUMENT_KEYS`]. Strings are taken as-is when non-empty,
/// numbers and booleans by their JSON text. Returns an empty string if
/// nothing matches.
pub fn extract_argument(
    arguments: &Map<String, Value>,
    signature: &[&str],
) -> String {
    signature
        .first()
        .into_iter()
        .chain(FALLBACK_ARGUMENT_KEYS.iter())
        .find_map(|key| match arguments.get(*key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            v @ (Value::Number(_) | Value::Bool(_)) => Some(v.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}

/// Executes tool call requests against a [`Registry`].
///
/// Every request yields exactly one result with the same id, failures
/// included, so the conversation always stays well-formed.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    tool_timeout: Option<Duration>,
}

impl Dispatcher {
    /// Creates a dispatcher over the given registry.
    #[inline]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            tool_timeout: None,
        }
    }

    /// Sets a time limit for every tool invocation.
    #[inline]
    pub fn with_tool_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Returns the registry the tools are looked up from.
    #[inline]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Runs a batch of tool calls concurrently.
    ///
    /// The results are in the same order as `requests`.
    pub async fn execute(
        &self,
        requests: &[ToolCallRequest],
    ) -> Vec<ToolCallResult> {
        let span = debug_span!("tool dispatcher", count = requests.len());
        let futs = requests.iter().map(|req| self.execute_one(req));
        join_all(futs).instrument(span).await
    }

    async fn execute_one(&self, req: &ToolCallRequest) -> ToolCallResult {
        let content = match self.registry.resolve(&req.name) {
            Ok(tool) => match self.invoke(tool.as_ref(), req).await {
                Ok(output) => output,
                Err(err) => {
                    warn!("tool `{}` ({}) failed: {err}", req.name, req.id);
                    format!("Error: {err}")
                }
            },
            Err(err) => {
                warn!("{err}");
                TOOL_NOT_FOUND_NOTICE.to_owned()
            }
        };
        ToolCallResult {
            id: req.id.clone(),
            content,
        }
    }

    async fn invoke(
        &self,
        tool: &dyn ToolObject,
        req: &ToolCallRequest,
    ) -> ToolResult {
        let input = extract_argument(&req.arguments, tool.signature());
        trace!("calling tool `{}` ({}) with input: {input:?}", req.name, req.id);

        let fut = AssertUnwindSafe(tool.execute(input)).catch_unwind();
        let caught = match self.tool_timeout {
            Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
                Error::timed_out()
                    .with_reason(format!("no result after {limit:?}"))
            })?,
            None => fut.await,
        };
        caught.unwrap_or_else(|_| {
            Err(Error::execution_error().with_reason("the tool panicked"))
        })
    }
}
