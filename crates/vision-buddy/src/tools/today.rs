use std::future::ready;

use chrono::{Local, NaiveDate};
use schemars::{JsonSchema, schema_for};
use serde_json::Value;
use vision_buddy_core::tool::{Tool, ToolResult};

/// Parameters of [`TodayTool`]. It takes none, the field only exists so the
/// model has something to send.
#[allow(dead_code)]
#[derive(JsonSchema)]
struct TodayToolParameters {
    #[schemars(description = "Ignored, may be left empty.")]
    query: Option<String>,
}

/// A tool that tells the current local date.
pub struct TodayTool {
    parameter_schema: Value,
}

impl TodayTool {
    /// Creates a new date tool.
    #[inline]
    pub fn new() -> Self {
        Self {
            parameter_schema: schema_for!(TodayToolParameters).to_value(),
        }
    }
}

impl Default for TodayTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for TodayTool {
    fn name(&self) -> &str {
        "today_tool"
    }

    fn description(&self) -> &str {
        r#"
Returns today's date. Use it when the user asks about the current day,
schedules, or how long ago symptoms started."#
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        _input: String,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        ready(Ok(describe_date(Local::now().date_naive())))
    }
}

fn describe_date(date: NaiveDate) -> String {
    date.format("Today is %A, %d %B %Y").to_string()
}
