use reqwest::Client;
use schemars::{JsonSchema, schema_for};
use serde_json::Value;
use vision_buddy_core::tool::{Error as ToolError, Tool, ToolResult};

const DEFAULT_BASE_URL: &str = "https://html.duckduckgo.com";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; VisionBuddy/0.1)";
const MAX_RESULTS: usize = 5;

/// The tool result when the search engine returns nothing.
pub const NO_RESULTS_NOTICE: &str = "No results found.";

#[allow(dead_code)]
#[derive(JsonSchema)]
struct SearchToolParameters {
    #[schemars(description = "The search query.")]
    query: String,
}

/// A tool for searching the internet with DuckDuckGo.
///
/// The HTML endpoint is used, so no API key is needed.
pub struct SearchTool {
    client: Client,
    base_url: String,
    parameter_schema: Value,
}

impl SearchTool {
    /// Creates a search tool.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_owned(),
            parameter_schema: schema_for!(SearchToolParameters).to_value(),
        }
    }

    /// Sends queries to another host, e.g. a mirror or a test server.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }
}

impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search_tool"
    }

    fn description(&self) -> &str {
        r#"
Searches the internet using DuckDuckGo. Use it when the textbook lacks useful
content, for general questions or trending topics."#
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn signature(&self) -> &[&str] {
        &["query"]
    }

    fn execute(
        &self,
        input: String,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let url = format!(
            "{}/html/?q={}",
            self.base_url,
            urlencoding::encode(&input)
        );
        let request = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT);

        async move {
            if input.trim().is_empty() {
                return Err(ToolError::invalid_input()
                    .with_reason("the search query is empty"));
            }
            let html = request
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(|err| {
                    ToolError::execution_error()
                        .with_reason(format!("search failed: {err}"))
                })?
                .text()
                .await
                .map_err(|err| {
                    ToolError::execution_error()
                        .with_reason(format!("search failed: {err}"))
                })?;

            let results = extract_results(&html);
            debug!("search for {input:?} returned {} results", results.len());
            if results.is_empty() {
                return Ok(NO_RESULTS_NOTICE.to_owned());
            }
            Ok(results
                .iter()
                .map(SearchResult::render)
                .collect::<Vec<_>>()
                .join("\n\n"))
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct SearchResult {
    title: String,
    snippet: String,
    url: String,
}

impl SearchResult {
    fn render(&self) -> String {
        format!("{}\n{}\n{}", self.title, self.snippet, self.url)
    }
}

/// Pulls results out of a DuckDuckGo HTML page.
fn extract_results(html: &str) -> Vec<SearchResult> {
    html.split("result__body")
        .skip(1)
        .filter_map(|block| {
            let title = element_text(block, "result__a")?;
            let snippet =
                element_text(block, "result__snippet").unwrap_or_default();
            let url = element_text(block, "result__url").unwrap_or_default();
            Some(SearchResult { title, snippet, url })
        })
        .take(MAX_RESULTS)
        .collect()
}

/// Returns the text of the first element carrying `class`, with inline tags
/// such as `<b>` removed. `None` if there is no such element or it is empty.
fn element_text(block: &str, class: &str) -> Option<String> {
    let marker = format!("class=\"{class}\"");
    let (_, rest) = block.split_once(&marker)?;
    let (_, rest) = rest.split_once('>')?;
    let end = rest.find("</a>").or_else(|| rest.find("</div>"))?;

    let mut text = String::new();
    let mut in_tag = false;
    for c in rest[..end].chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }
    let text =
        decode_entities(text.split_whitespace().collect::<Vec<_>>().join(" "));
    (!text.is_empty()).then_some(text)
}

fn decode_entities(s: String) -> String {
    if !s.contains('&') {
        return s;
    }
    s.replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
