use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Error, Tool, ToolResult};

/// How many passages a [`DocumentIndexTool`] asks for by default.
pub const DEFAULT_RESULT_COUNT: usize = 5;

/// The tool result when the index has nothing relevant.
pub const NO_INFORMATION_NOTICE: &str = "No information found in the documents.";

const DEFAULT_NAME: &str = "retriever_tool";
const DEFAULT_DESCRIPTION: &str = "\
Searches the reference documents and returns the most relevant passages. \
Use it first for any question the documents may cover.";

/// A similarity index over a corpus of documents.
#[async_trait]
pub trait DocumentIndex: Send + Sync + 'static {
    /// Returns up to `k` passages relevant to `query`, most relevant first.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<String>, Error>;
}

/// Exposes a [`DocumentIndex`] to the model as a tool.
pub struct DocumentIndexTool<I: ?Sized> {
    index: Arc<I>,
    name: String,
    description: String,
    result_count: usize,
    schema: Value,
}

impl<I: DocumentIndex + ?Sized> DocumentIndexTool<I> {
    /// Wraps an index with the default name, description and result count.
    pub fn new(index: Arc<I>) -> Self {
        Self {
            index,
            name: DEFAULT_NAME.to_owned(),
            description: DEFAULT_DESCRIPTION.to_owned(),
            result_count: DEFAULT_RESULT_COUNT,
            schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to look up in the documents."
                    }
                },
                "required": ["query"]
            }),
        }
    }

    /// Overrides the tool name.
    #[inline]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Overrides the tool description.
    #[inline]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Overrides how many passages are requested, at least one.
    #[inline]
    pub fn with_result_count(mut self, k: usize) -> Self {
        self.result_count = k.max(1);
        self
    }
}

impl<I: DocumentIndex + ?Sized> Tool for DocumentIndexTool<I> {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameter_schema(&self) -> &Value {
        &self.schema
    }

    fn signature(&self) -> &[&str] {
        &["query"]
    }

    fn execute(
        &self,
        input: String,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let index = Arc::clone(&self.index);
        let k = self.result_count;
        async move {
            let passages = index.search(&input, k).await?;
            debug!("retrieved {} passages for {input:?}", passages.len());
            Ok(format_passages(&passages))
        }
    }
}

fn format_passages(passages: &[String]) -> String {
    if passages.is_empty() {
        return NO_INFORMATION_NOTICE.to_owned();
    }
    passages
        .iter()
        .enumerate()
        .map(|(i, passage)| format!("Document {}:\n{}", i + 1, passage))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedIndex(Result<Vec<String>, Error>);

    #[async_trait]
    impl DocumentIndex for FixedIndex {
        async fn search(
            &self,
            _query: &str,
            k: usize,
        ) -> Result<Vec<String>, Error> {
            self.0
                .clone()
                .map(|passages| passages.into_iter().take(k).collect())
        }
    }

    fn tool(result: Result<Vec<String>, Error>) -> DocumentIndexTool<FixedIndex> {
        DocumentIndexTool::new(Arc::new(FixedIndex(result)))
    }

    #[tokio::test]
    async fn test_format_passages() {
        let tool = tool(Ok(vec![
            "Glaucoma damages the optic nerve.".to_owned(),
            "Raised intraocular pressure is a risk factor.".to_owned(),
        ]));
        assert_eq!(tool.name(), "retriever_tool");
        let output = tool.execute("glaucoma".to_owned()).await.unwrap();
        assert_eq!(
            output,
            "Document 1:\nGlaucoma damages the optic nerve.\n\n\
             Document 2:\nRaised intraocular pressure is a risk factor."
        );
    }

    #[tokio::test]
    async fn test_result_count() {
        let passages = (0..8).map(|i| format!("passage {i}")).collect();
        let tool = tool(Ok(passages)).with_result_count(2);
        let output = tool.execute("cataract".to_owned()).await.unwrap();
        assert!(output.contains("Document 2:"));
        assert!(!output.contains("Document 3:"));
    }

    #[tokio::test]
    async fn test_no_information() {
        let tool = tool(Ok(vec![]));
        let output = tool.execute("keratoconus".to_owned()).await.unwrap();
        assert_eq!(output, NO_INFORMATION_NOTICE);
    }

    #[tokio::test]
    async fn test_index_error() {
        let tool = tool(Err(Error::execution_error().with_reason("index offline")));
        let err = tool.execute("uveitis".to_owned()).await.unwrap_err();
        assert_eq!(err.to_string(), "Execution error: index offline");
    }
}
