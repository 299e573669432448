use std::time::Duration;

use reqwest::Client;
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;
use vision_buddy_core::tool::{Error as ToolError, Tool, ToolResult};

const DEFAULT_BASE_URL: &str = "https://www.who.int";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ENTRIES: usize = 3;

/// The tool result when the WHO search has no entries.
pub const NO_WHO_INFO_NOTICE: &str = "No WHO information found.";

#[allow(dead_code)]
#[derive(JsonSchema)]
struct WhoDiseaseInfoParameters {
    #[schemars(description = "The name of the disease.")]
    disease: String,
}

/// A tool that looks up diseases with the World Health Organization search
/// API.
pub struct WhoDiseaseInfoTool {
    client: Client,
    base_url: String,
    parameter_schema: Value,
}

impl WhoDiseaseInfoTool {
    /// Creates a WHO lookup tool.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_owned(),
            parameter_schema: schema_for!(WhoDiseaseInfoParameters).to_value(),
        }
    }

    /// Sends lookups to another host, e.g. a test server.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
}

impl Tool for WhoDiseaseInfoTool {
    fn name(&self) -> &str {
        "who_disease_info"
    }

    fn description(&self) -> &str {
        r#"
Provides disease information from the World Health Organization. Use it for
general facts such as symptoms, prevalence, or risk factors."#
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn signature(&self) -> &[&str] {
        &["disease"]
    }

    fn execute(
        &self,
        input: String,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let request = self
            .client
            .get(format!(
                "{}/api/search?q={}",
                self.base_url,
                urlencoding::encode(&input)
            ))
            .timeout(REQUEST_TIMEOUT);

        async move {
            let resp = request.send().await.map_err(|err| {
                ToolError::execution_error()
                    .with_reason(format!("error accessing WHO data: {err}"))
            })?;
            if !resp.status().is_success() {
                warn!("WHO API responded with {}", resp.status());
                return Err(ToolError::execution_error()
                    .with_reason("WHO API could not be reached"));
            }
            let body = resp.bytes().await.map_err(|err| {
                ToolError::execution_error()
                    .with_reason(format!("error accessing WHO data: {err}"))
            })?;
            let data: SearchResponse =
                serde_json::from_slice(&body).map_err(|err| {
                    ToolError::execution_error()
                        .with_reason(format!("unexpected WHO response: {err}"))
                })?;

            if data.results.is_empty() {
                return Ok(NO_WHO_INFO_NOTICE.to_owned());
            }
            Ok(data
                .results
                .iter()
                .take(MAX_ENTRIES)
                .map(|entry| format!("{}\n{}", entry.title, entry.link))
                .collect::<Vec<_>>()
                .join("\n\n"))
        }
    }
}
