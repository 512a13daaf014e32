use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One tool call made while answering an instruction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolTrace {
    pub tool: String,
    pub args: Value,
    pub success: bool,
    pub output: Option<Value>,
    pub error: Option<String>,
    pub at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentResult {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
    pub iterations: usize,
    pub trace: Vec<ToolTrace>,
}
