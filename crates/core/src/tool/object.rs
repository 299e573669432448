use std::pin::Pin;

use serde_json::Value;
use vision_buddy_model::ModelTool;

use super::{Tool, ToolResult};

/// A type-erased [`Tool`], as stored in a [`Registry`](super::Registry).
pub trait ToolObject: Send + Sync + 'static {
    /// See [`Tool::name`].
    fn name(&self) -> &str;

    /// See [`Tool::description`].
    fn description(&self) -> &str;

    /// See [`Tool::parameter_schema`].
    fn parameter_schema(&self) -> &Value;

    /// See [`Tool::signature`].
    fn signature(&self) -> &[&str];

    /// See [`Tool::execute`].
    fn execute(
        &self,
        input: String,
    ) -> Pin<Box<dyn Future<Output = ToolResult> + Send>>;

    /// Returns the declaration of this tool sent to the model.
    fn definition(&self) -> ModelTool {
        ModelTool {
            name: self.name().to_owned(),
            description: self.description().trim().to_owned(),
            parameters: self.parameter_schema().clone(),
        }
    }
}

pub(crate) struct AnyTool<T: Tool>(pub T);

impl<T: Tool> ToolObject for AnyTool<T> {
    #[inline]
    fn name(&self) -> &str {
        self.0.name()
    }

    #[inline]
    fn description(&self) -> &str {
        self.0.description()
    }

    #[inline]
    fn parameter_schema(&self) -> &Value {
        self.0.parameter_schema()
    }

    #[inline]
    fn signature(&self) -> &[&str] {
        self.0.signature()
    }

    #[inline]
    fn execute(
        &self,
        input: String,
    ) -> Pin<Box<dyn Future<Output = ToolResult> + Send>> {
        Box::pin(self.0.execute(input))
    }
}
