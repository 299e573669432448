//! Tool call supports.
//!
//! Tools are registered once into an immutable [`Registry`], and the
//! [`Dispatcher`] turns tool call requests from the model into tool result
//! messages.

mod dispatcher;
mod error;
mod object;
mod registry;
mod retrieval;

use serde_json::Value;

pub use dispatcher::{
    Dispatcher, FALLBACK_ARGUMENT_KEYS, TOOL_NOT_FOUND_NOTICE, extract_argument,
};
pub use error::{Error, ErrorKind};
pub use object::ToolObject;
pub use registry::{Registry, RegistryBuilder, RegistryError};
pub use retrieval::{
    DEFAULT_RESULT_COUNT, DocumentIndex, DocumentIndexTool,
    NO_INFORMATION_NOTICE,
};

/// The result of a tool call.
pub type ToolResult = Result<String, Error>;

/// A tool that can be called by the model.
///
/// From the agent's point of view a tool is a function from one string to
/// another string. The dispatcher picks that string out of the arguments the
/// model supplied, see [`extract_argument`].
///
/// Implementations of this trait should be stateless. A tool that needs
/// context (an HTTP client, a document index) should hold it as immutable
/// state set during initialization, and clone what it needs into the
/// returned future.
pub trait Tool: Send + Sync + 'static {
    /// Returns the name of the tool, which must be unique in a registry.
    fn name(&self) -> &str;

    /// Returns the description of the tool.
    fn description(&self) -> &str;

    /// Returns the parameter schema of the tool.
    fn parameter_schema(&self) -> &Value;

    /// Returns the names of the arguments the tool expects, the primary one
    /// first.
    ///
    /// The default is an empty signature, in that case the dispatcher only
    /// probes the fallback keys.
    fn signature(&self) -> &[&str] {
        &[]
    }

    /// Executes the tool with the given input.
    ///
    /// This method must return a future that is fully independent of `self`,
    /// and the future should be cancellation safe.
    fn execute(
        &self,
        input: String,
    ) -> impl Future<Output = ToolResult> + Send + 'static;
}
