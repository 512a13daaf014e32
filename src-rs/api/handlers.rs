use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::agent::{Agent, ExecuteOptions};
use crate::error::ToolError;
use crate::result::{AgentResult, ToolTrace};
use crate::tools::{ToolRegistry, ToolResult, ToolSchema};

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<Agent>,
}

impl AppState {
    pub fn new(agent: Agent) -> Self {
        Self {
            agent: Arc::new(agent),
        }
    }

    fn tools(&self) -> Arc<ToolRegistry> {
        self.agent.tools().clone()
    }
}

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub instruction: String,
    pub system_prompt: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub debug: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub success: bool,
    pub output: String,
    pub iterations: usize,
    pub trace: Option<Vec<ToolTrace>>,
    pub error: Option<String>,
}

pub async fn handle_health() -> Json<Value> {
    Json(json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")}))
}

pub async fn handle_tools(State(state): State<AppState>) -> Json<Value> {
    let schemas: Vec<ToolSchema> = state.tools().get_schemas();
    Json(json!({"tools": schemas}))
}

pub async fn handle_invoke(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> (StatusCode, Json<ToolResult>) {
    let args = match parse_arguments(&body) {
        Ok(args) => args,
        Err(err) => {
            info!(tool = %name, error = %err, "rejected tool arguments");
            return (status_for(&err), Json(ToolResult::from_outcome(Err(err))));
        }
    };
    let tools = state.tools();
    let tool_name = name.clone();

    // remote tools block on HTTP
    let outcome = tokio::task::spawn_blocking(move || tools.invoke(&tool_name, args)).await;

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(tool = %name, error = %err, "tool task panicked");
            Err(ToolError::ExecutionFailed(err.to_string()))
        }
    };
    let status = match &outcome {
        Ok(_) => StatusCode::OK,
        Err(err) => status_for(err),
    };
    info!(tool = %name, status = status.as_u16(), "tool invoked over http");
    (status, Json(ToolResult::from_outcome(outcome)))
}

pub async fn handle_execute(
    State(state): State<AppState>,
    Json(req): Json<ExecuteRequest>,
) -> Json<ExecuteResponse> {
    if req.instruction.trim().is_empty() {
        return Json(ExecuteResponse {
            success: false,
            output: String::new(),
            iterations: 0,
            trace: None,
            error: Some("instruction required".to_string()),
        });
    }

    let debug = req.debug.unwrap_or(false);
    let opts = ExecuteOptions {
        system_prompt: req.system_prompt,
        model: req.model,
        temperature: req.temperature,
    };
    let instruction = req.instruction;
    let agent = state.agent.clone();

    let result = tokio::task::spawn_blocking(move || agent.execute_with(&instruction, &opts)).await;

    match result {
        Ok(result) => Json(to_response(result, debug)),
        Err(err) => Json(ExecuteResponse {
            success: false,
            output: String::new(),
            iterations: 0,
            trace: None,
            error: Some(err.to_string()),
        }),
    }
}

/// An empty body means no arguments; anything else must be valid JSON.
fn parse_arguments(body: &[u8]) -> Result<Value, ToolError> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
        .map_err(|err| ToolError::InvalidArgument(format!("malformed JSON body: {}", err)))
}

pub fn status_for(err: &ToolError) -> StatusCode {
    match err {
        ToolError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        ToolError::ToolNotFound(_) => StatusCode::NOT_FOUND,
        ToolError::ExecutionFailed(_) => StatusCode::BAD_GATEWAY,
    }
}

fn to_response(result: AgentResult, debug: bool) -> ExecuteResponse {
    ExecuteResponse {
        success: result.success,
        output: result.output,
        iterations: result.iterations,
        trace: if debug { Some(result.trace) } else { None },
        error: result.error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;
    use crate::llm::LLMRouter;
    use crate::tools::get_orders_tool;

    fn state() -> AppState {
        let tools = ToolRegistry::builder().tool(get_orders_tool()).build().unwrap();
        let config = AgentConfig {
            paylink: None,
            ..AgentConfig::default()
        };
        AppState::new(Agent::new("api-test", config, "", LLMRouter::new("none"), Arc::new(tools)))
    }

    #[tokio::test]
    async fn invoke_returns_matching_orders() {
        let (status, Json(result)) = handle_invoke(
            State(state()),
            Path("get_orders".to_string()),
            Bytes::from(json!({"payment_status": "PAID"}).to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let orders = result.output.unwrap();
        assert_eq!(orders.as_array().map(|a| a.len()), Some(1));
        assert_eq!(orders[0]["name"], json!("Item 1"));
    }

    #[tokio::test]
    async fn invoke_without_body_returns_all_orders() {
        let (status, Json(result)) =
            handle_invoke(State(state()), Path("get_orders".to_string()), Bytes::new()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result.output.unwrap().as_array().map(|a| a.len()), Some(2));
    }

    #[tokio::test]
    async fn invoke_maps_errors_to_status() {
        let (status, Json(result)) = handle_invoke(
            State(state()),
            Path("get_orders".to_string()),
            Bytes::from(json!({"payment_status": "refunded"}).to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(result.error_code.as_deref(), Some("invalid_argument"));

        let (status, _) =
            handle_invoke(State(state()), Path("missing".to_string()), Bytes::new()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invoke_rejects_malformed_body() {
        let (status, Json(result)) = handle_invoke(
            State(state()),
            Path("get_orders".to_string()),
            Bytes::from_static(br#"{"payment_status": "refunded""#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!result.success);
        assert!(result.output.is_none());
        assert_eq!(result.error_code.as_deref(), Some("invalid_argument"));
    }

    #[tokio::test]
    async fn invoke_rejects_non_object_body() {
        let (status, _) = handle_invoke(
            State(state()),
            Path("get_orders".to_string()),
            Bytes::from_static(b"\"paid\""),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn tools_lists_schemas_in_order() {
        let Json(body) = handle_tools(State(state())).await;
        assert_eq!(body["tools"][0]["name"], json!("get_orders"));
        assert_eq!(
            body["tools"][0]["parameters"]["properties"]["payment_status"]["enum"],
            json!(["paid", "pending", "failed"])
        );
    }

    #[tokio::test]
    async fn execute_rejects_blank_instruction() {
        let Json(resp) = handle_execute(
            State(state()),
            Json(ExecuteRequest {
                instruction: "  ".to_string(),
                system_prompt: None,
                model: None,
                temperature: None,
                debug: None,
            }),
        )
        .await;
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("instruction required"));
    }

    #[tokio::test]
    async fn execute_surfaces_model_errors() {
        let Json(resp) = handle_execute(
            State(state()),
            Json(ExecuteRequest {
                instruction: "list my orders".to_string(),
                system_prompt: None,
                model: None,
                temperature: None,
                debug: Some(true),
            }),
        )
        .await;
        assert!(!resp.success);
        assert!(resp.error.unwrap().contains("provider_missing"));
    }
}
