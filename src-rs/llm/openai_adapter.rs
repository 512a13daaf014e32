use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::rotation::Rotator;
use super::types::{CompletionRequest, LLMResponse, Message, ProviderAdapter, ProviderError, ToolCall};
use crate::tools::ToolSchema;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com";

pub struct OpenAIConfig {
    pub api_keys: Vec<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
}

pub struct OpenAIAdapter {
    cfg: OpenAIConfig,
    rotator: Rotator,
    client: Client,
}

impl OpenAIAdapter {
    pub fn new(mut cfg: OpenAIConfig) -> Result<Self, ProviderError> {
        if cfg.base_url.is_empty() {
            cfg.base_url = OPENAI_BASE_URL.to_string();
        }
        if cfg.model.is_empty() {
            cfg.model = super::model::DEFAULT_MODEL.to_string();
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| ProviderError::new("client_error", &err.to_string(), false))?;
        Ok(Self {
            rotator: Rotator::new(cfg.api_keys.clone()),
            cfg,
            client,
        })
    }
}

impl ProviderAdapter for OpenAIAdapter {
    fn complete(&self, request: CompletionRequest) -> Result<LLMResponse, ProviderError> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.cfg.model.clone());
        let temperature = request.temperature.unwrap_or(self.cfg.temperature);
        let payload = build_payload(&model, &request.messages, request.tools.as_ref(), temperature);

        let tries = self.rotator.len();
        if self.rotator.is_empty() {
            return Err(ProviderError::new("auth_error", "no OpenAI API keys", false));
        }
        let mut last_err = None;
        for _ in 0..tries {
            let key = match self.rotator.next() {
                Some(key) => key,
                None => break,
            };
            match send_request(&self.client, &self.cfg.base_url, key, &payload) {
                Ok(resp) => return Ok(resp),
                Err(err) if err.retryable => {
                    warn!(code = %err.code, "openai request failed, rotating key");
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err.unwrap_or_else(|| ProviderError::new("api_error", "request failed", true)))
    }
}

fn build_payload(model: &str, messages: &[Message], tools: Option<&Vec<ToolSchema>>, temperature: f64) -> Value {
    let messages: Vec<Value> = messages
        .iter()
        .map(|msg| {
            json!({
                "role": msg.role,
                "content": msg.content,
            })
        })
        .collect();

    let mut payload = json!({
        "model": model,
        "messages": messages,
        "temperature": temperature,
    });

    if let Some(tools) = tools.filter(|tools| !tools.is_empty()) {
        let functions: Vec<Value> = tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.parameters.clone().unwrap_or(json!({"type": "object", "properties": {}})),
                    }
                })
            })
            .collect();
        payload["tools"] = json!(functions);
    }

    payload
}

fn send_request(client: &Client, base_url: &str, api_key: &str, payload: &Value) -> Result<LLMResponse, ProviderError> {
    let endpoint = format!("{}/v1/chat/completions", base_url.trim_end_matches('/'));
    debug!(endpoint = %endpoint, "sending chat completion");
    let resp = client
        .post(endpoint)
        .bearer_auth(api_key)
        .json(payload)
        .send()
        .map_err(|err| ProviderError::new("network_error", &err.to_string(), true))?;

    let status = resp.status();
    let body = resp.text().unwrap_or_default();
    if status.is_client_error() || status.is_server_error() {
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ProviderError::new("auth_error", &body, true));
        }
        if status.as_u16() == 429 || body.to_lowercase().contains("insufficient_quota") {
            return Err(ProviderError::new("rate_limit", &body, true));
        }
        if status.is_server_error() {
            return Err(ProviderError::new("server_error", &body, true));
        }
        return Err(ProviderError::new("api_error", &body, false));
    }

    let raw: Value = serde_json::from_str(&body)
        .map_err(|_| ProviderError::new("parse_error", "invalid json", false))?;
    let (content, tool_calls) = parse_response(&raw)?;
    Ok(LLMResponse {
        content,
        tool_calls,
        raw: Some(raw),
    })
}

fn parse_response(raw: &Value) -> Result<(String, Vec<ToolCall>), ProviderError> {
    let mut tool_calls = Vec::new();

    let message = raw
        .pointer("/choices/0/message")
        .ok_or_else(|| ProviderError::new("parse_error", "response has no choices[0].message", false))?;
    let text = message
        .get("content")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    if let Some(calls) = message.get("tool_calls").and_then(|v| v.as_array()) {
        for call in calls {
            let function = match call.get("function") {
                Some(function) => function,
                None => continue,
            };
            let name = function.get("name").and_then(|v| v.as_str()).unwrap_or("");
            // arguments arrive as a JSON-encoded string
            let args = match function.get("arguments") {
                Some(Value::String(encoded)) if encoded.trim().is_empty() => json!({}),
                Some(Value::String(encoded)) => {
                    serde_json::from_str(encoded).unwrap_or_else(|_| Value::String(encoded.clone()))
                }
                Some(other) => other.clone(),
                None => json!({}),
            };
            tool_calls.push(ToolCall {
                name: name.to_string(),
                args,
            });
        }
    }

    Ok((text, tool_calls))
}
