use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::llm::{CompletionRequest, LLMRouter, Message};
use crate::tools::{ToolRegistry, ToolResult};

use crate::config::AgentConfig;
use crate::result::{AgentResult, ToolTrace};

const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful shopping assistant. Use the available tools to look up orders and handle payments.";

/// Per-call overrides applied on top of the agent's configuration.
#[derive(Clone, Debug, Default)]
pub struct ExecuteOptions {
    pub system_prompt: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
}

/// A chat model bound to an assembled tool registry.
pub struct Agent {
    pub name: String,
    pub config: AgentConfig,
    pub system_prompt: String,
    router: LLMRouter,
    tools: Arc<ToolRegistry>,
}

impl Agent {
    pub fn new(
        name: &str,
        mut config: AgentConfig,
        system_prompt: &str,
        router: LLMRouter,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        let resolved_name = if name.is_empty() { "agent" } else { name };
        let prompt = if system_prompt.is_empty() {
            DEFAULT_SYSTEM_PROMPT
        } else {
            system_prompt
        };
        if config.max_iterations == 0 {
            config.max_iterations = AgentConfig::default().max_iterations;
        }
        Self {
            name: resolved_name.to_string(),
            config,
            system_prompt: prompt.to_string(),
            router,
            tools,
        }
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    pub fn execute(&self, instruction: &str) -> AgentResult {
        self.execute_with(instruction, &ExecuteOptions::default())
    }

    pub fn execute_with(&self, instruction: &str, opts: &ExecuteOptions) -> AgentResult {
        let system_prompt = opts.system_prompt.as_deref().unwrap_or(&self.system_prompt);
        let mut messages = vec![Message::system(system_prompt), Message::user(instruction)];
        let mut trace = Vec::new();

        let tool_schemas = if self.tools.is_empty() {
            None
        } else {
            Some(self.tools.get_schemas())
        };
        let temperature = opts.temperature.unwrap_or(self.config.temperature);

        for iteration in 1..=self.config.max_iterations {
            let request = CompletionRequest {
                messages: messages.clone(),
                tools: tool_schemas.clone(),
                temperature: Some(temperature),
                model: opts.model.clone(),
                provider: None,
                metadata: None,
            };
            let response = match self.router.complete(request) {
                Ok(resp) => resp,
                Err(err) => {
                    warn!(agent = %self.name, error = %err, "completion failed");
                    return AgentResult {
                        success: false,
                        output: String::new(),
                        error: Some(err.to_string()),
                        iterations: iteration,
                        trace,
                    };
                }
            };

            if response.tool_calls.is_empty() {
                info!(agent = %self.name, iterations = iteration, "instruction completed");
                return AgentResult {
                    success: true,
                    output: response.content,
                    error: None,
                    iterations: iteration,
                    trace,
                };
            }

            messages.push(Message::assistant(&response.content));

            for call in response.tool_calls {
                debug!(agent = %self.name, tool = %call.name, "model requested tool");
                let result = self.tools.execute(&call.name, call.args.clone());
                messages.push(Message::user(&render_tool_result(&call.name, &result)));
                trace.push(ToolTrace {
                    tool: call.name,
                    args: call.args,
                    success: result.success,
                    output: result.output,
                    error: result.error,
                    at: Utc::now(),
                });
            }
        }

        warn!(agent = %self.name, "max iterations reached");
        AgentResult {
            success: false,
            output: String::new(),
            error: Some("max iterations reached".to_string()),
            iterations: self.config.max_iterations,
            trace,
        }
    }
}

fn render_tool_result(name: &str, result: &ToolResult) -> String {
    if result.success {
        format!("Tool {} result: {}", name, render_value(result.output.as_ref()))
    } else {
        format!(
            "Tool {} error: {}",
            name,
            result.error.as_deref().unwrap_or("unknown error")
        )
    }
}

fn render_value(value: Option<&Value>) -> String {
    match value {
        Some(val) => val.to_string(),
        None => "".to_string(),
    }
}
