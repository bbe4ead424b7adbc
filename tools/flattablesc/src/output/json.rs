//! JSON Output Formatting

use flattables::GenerationReport;
use serde::Serialize;

/// What `generate --json` prints.
#[derive(Debug, Serialize)]
pub struct JsonSummary<'a> {
    #[serde(flatten)]
    pub report: &'a GenerationReport,
    /// Full compiler command line, if the compiler ran (or would have).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler_output: Option<String>,
}

/// Format data as pretty JSON
pub fn format_json_pretty<T: Serialize + ?Sized>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(data)
}
