use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug)]
pub struct CLIConfig {
    pub base_url: String,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub temperature: f64,
    pub debug: bool,
    pub token: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ExecuteRequest {
    pub instruction: String,
    pub system_prompt: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub debug: bool,
}

#[derive(Debug, Deserialize)]
pub struct ExecuteResponse {
    pub success: bool,
    pub output: String,
    #[serde(default)]
    pub iterations: usize,
    pub trace: Option<Vec<TraceEntry>>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TraceEntry {
    pub tool: String,
    pub args: Value,
    pub success: bool,
    pub output: Option<Value>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub parameters: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct InvokeResponse {
    pub success: bool,
    pub output: Option<Value>,
    pub error: Option<String>,
}
