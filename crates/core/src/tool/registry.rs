use std::collections::HashMap;
use std::sync::Arc;

use vision_buddy_model::ModelTool;

use super::Tool;
use super::object::{AnyTool, ToolObject};

/// Errors from registering or resolving tools.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A tool with the same name has been registered.
    #[error("tool `{0}` is already registered")]
    DuplicateTool(String),
    /// No tool with the name has been registered.
    #[error("tool `{0}` is not registered")]
    UnknownTool(String),
}

/// [`Registry`] builder.
///
/// This is the only place where tools can be added, once the registry is
/// built it can no longer change.
#[derive(Default)]
pub struct RegistryBuilder {
    tools: Vec<Arc<dyn ToolObject>>,
    index: HashMap<String, usize>,
}

impl RegistryBuilder {
    /// Creates an empty builder.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool.
    ///
    /// Fails if a tool with the same name has been registered, the builder
    /// is left unchanged in that case.
    pub fn register<T: Tool>(&mut self, tool: T) -> Result<(), RegistryError> {
        let name = tool.name().to_owned();
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateTool(name));
        }
        trace!("registering tool: {name}");
        self.index.insert(name, self.tools.len());
        self.tools.push(Arc::new(AnyTool(tool)));
        Ok(())
    }

    /// Registers a tool, builder style.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Result<Self, RegistryError> {
        self.register(tool)?;
        Ok(self)
    }

    /// Freezes the registered tools into a registry.
    #[inline]
    pub fn build(self) -> Registry {
        Registry {
            tools: self.tools,
            index: self.index,
        }
    }
}

/// An immutable set of tools, keyed by their unique names.
///
/// The registry is read-only after construction, so it can be shared by
/// multiple agents behind an [`Arc`].
#[derive(Default)]
pub struct Registry {
    tools: Vec<Arc<dyn ToolObject>>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// Creates a [`RegistryBuilder`].
    #[inline]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Looks up a tool by name.
    pub fn resolve(
        &self,
        name: &str,
    ) -> Result<Arc<dyn ToolObject>, RegistryError> {
        self.index
            .get(name)
            .map(|&idx| Arc::clone(&self.tools[idx]))
            .ok_or_else(|| RegistryError::UnknownTool(name.to_owned()))
    }

    /// Returns the declarations of all tools, in registration order.
    #[inline]
    pub fn definitions(&self) -> Vec<ModelTool> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }

    /// Returns the names of all tools, in registration order.
    #[inline]
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|tool| tool.name())
    }

    /// Returns the number of tools.
    #[inline]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if no tool has been registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::future::ready;
    use std::sync::LazyLock;

    use serde_json::{Value, json};

    use super::*;
    use crate::tool::ToolResult;

    static SCHEMA: LazyLock<Value> = LazyLock::new(|| {
        json!({
            "type": "object",
            "properties": { "query": { "type": "string" } }
        })
    });

    struct NamedTool(&'static str);

    impl Tool for NamedTool {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "\nA test tool.\n"
        }

        fn parameter_schema(&self) -> &Value {
            &SCHEMA
        }

        fn execute(
            &self,
            input: String,
        ) -> impl Future<Output = ToolResult> + Send + 'static {
            ready(Ok(input))
        }
    }

    #[test]
    fn test_duplicate_tool() {
        let mut builder = Registry::builder();
        builder.register(NamedTool("search_tool")).unwrap();
        let err = builder.register(NamedTool("search_tool")).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTool("search_tool".to_owned()));

        let registry = builder.build();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_resolve() {
        let registry = Registry::builder()
            .with_tool(NamedTool("search_tool"))
            .unwrap()
            .build();
        assert_eq!(registry.resolve("search_tool").unwrap().name(), "search_tool");
        assert_eq!(
            registry.resolve("read_file").err(),
            Some(RegistryError::UnknownTool("read_file".to_owned()))
        );
    }

    #[test]
    fn test_definitions_keep_registration_order() {
        let registry = Registry::builder()
            .with_tool(NamedTool("retriever_tool"))
            .and_then(|b| b.with_tool(NamedTool("search_tool")))
            .and_then(|b| b.with_tool(NamedTool("today_tool")))
            .unwrap()
            .build();

        let definitions = registry.definitions();
        let names: Vec<_> = definitions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["retriever_tool", "search_tool", "today_tool"]);
        assert_eq!(definitions[0].description, "A test tool.");
        assert_eq!(definitions[0].parameters, *SCHEMA);
        assert!(registry.names().eq(names));
    }
}
