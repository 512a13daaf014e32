//! PayLink payment tool provider.
//!
//! PayLink publishes its payment operations as an MCP server. This module speaks
//! the JSON-RPC subset needed to enumerate and call those tools over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::schema::InputSchema;
use super::types::{RemoteInvoker, ToolDescriptor, ToolHandler, ToolProvider};
use crate::error::{RegistryError, ToolError};

pub const PROVIDER_NAME: &str = "paylink";
pub const DEFAULT_BASE_URL: &str = "https://paylink-app.eastus.cloudapp.azure.com";
const PROTOCOL_VERSION: &str = "2024-11-05";
const SESSION_HEADER: &str = "mcp-session-id";

#[derive(Clone, Debug)]
pub struct PayLinkConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub payment_provider: Option<String>,
    pub timeout_secs: u64,
}

impl Default for PayLinkConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            payment_provider: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RemoteTool {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "inputSchema", default)]
    pub input_schema: Value,
}

pub struct PayLinkClient {
    cfg: PayLinkConfig,
    client: Client,
    session: Mutex<Option<String>>,
    next_id: AtomicU64,
}

impl PayLinkClient {
    pub fn new(cfg: PayLinkConfig) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()
            .map_err(|err| err.to_string())?;
        Ok(Self {
            cfg,
            client,
            session: Mutex::new(None),
            next_id: AtomicU64::new(1),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/mcp", self.cfg.base_url.trim_end_matches('/'))
    }

    fn headers(&self) -> Result<HeaderMap, String> {
        let api_key = self
            .cfg
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| "missing PAYLINK_API_KEY".to_string())?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/event-stream"),
        );
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| "invalid PAYLINK_API_KEY".to_string())?;
        headers.insert(AUTHORIZATION, bearer);
        if let Some(provider) = &self.cfg.payment_provider {
            let value = HeaderValue::from_str(provider)
                .map_err(|_| "invalid PAYLINK_PAYMENT_PROVIDER".to_string())?;
            headers.insert("x-payment-provider", value);
        }
        if let Ok(session) = self.session.lock() {
            if let Some(id) = session.as_deref() {
                if let Ok(value) = HeaderValue::from_str(id) {
                    headers.insert(SESSION_HEADER, value);
                }
            }
        }
        Ok(headers)
    }

    fn post(&self, request: &RpcRequest) -> Result<reqwest::blocking::Response, String> {
        let resp = self
            .client
            .post(self.endpoint())
            .headers(self.headers()?)
            .json(request)
            .send()
            .map_err(|err| err.to_string())?;

        let status = resp.status();
        if status.is_client_error() || status.is_server_error() {
            let body = resp.text().unwrap_or_default();
            return Err(format!("http {}: {}", status.as_u16(), body));
        }
        if let Some(id) = resp.headers().get(SESSION_HEADER).and_then(|v| v.to_str().ok()) {
            if let Ok(mut session) = self.session.lock() {
                *session = Some(id.to_string());
            }
        }
        Ok(resp)
    }

    fn rpc(&self, method: &str, params: Option<Value>) -> Result<Value, String> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: Some(self.next_id.fetch_add(1, Ordering::SeqCst)),
            method,
            params,
        };
        debug!(method, "paylink request");
        let resp = self.post(&request)?;
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = resp.text().map_err(|err| err.to_string())?;
        parse_rpc_body(&content_type, &body)
    }

    fn notify(&self, method: &str) -> Result<(), String> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: None,
            method,
            params: None,
        };
        self.post(&request).map(|_| ())
    }

    /// Opens a session. Must precede any other call.
    pub fn initialize(&self) -> Result<(), String> {
        let result = self.rpc(
            "initialize",
            Some(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                }
            })),
        )?;
        let server = result.get("serverInfo").cloned().unwrap_or_default();
        debug!(%server, "paylink initialized");
        if let Err(err) = self.notify("notifications/initialized") {
            warn!(error = %err, "paylink initialized notification rejected");
        }
        Ok(())
    }

    pub fn list_remote_tools(&self) -> Result<Vec<RemoteTool>, String> {
        let result = self.rpc("tools/list", Some(json!({})))?;
        parse_tool_list(&result)
    }
}

impl RemoteInvoker for PayLinkClient {
    fn call_tool(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let arguments = if args.is_null() { json!({}) } else { args };
        let result = self
            .rpc("tools/call", Some(json!({"name": name, "arguments": arguments})))
            .map_err(|err| ToolError::ExecutionFailed(format!("{}: {}", name, err)))?;
        parse_call_result(&result)
    }
}

/// Contributes PayLink's payment tools to the registry.
pub struct PayLinkProvider {
    client: Arc<PayLinkClient>,
}

impl PayLinkProvider {
    pub fn new(cfg: PayLinkConfig) -> Result<Self, RegistryError> {
        let client = PayLinkClient::new(cfg)
            .map_err(|err| RegistryError::unavailable(PROVIDER_NAME, err))?;
        Ok(Self {
            client: Arc::new(client),
        })
    }
}

impl ToolProvider for PayLinkProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn list_tools(&self) -> Result<Vec<ToolDescriptor>, RegistryError> {
        self.client
            .initialize()
            .map_err(|err| RegistryError::unavailable(PROVIDER_NAME, err))?;
        let remote = self
            .client
            .list_remote_tools()
            .map_err(|err| RegistryError::unavailable(PROVIDER_NAME, err))?;
        info!(count = remote.len(), "paylink tools enumerated");

        let invoker: Arc<dyn RemoteInvoker> = self.client.clone();
        Ok(remote
            .into_iter()
            .map(|tool| ToolDescriptor {
                description: tool.description.unwrap_or_default(),
                input_schema: InputSchema::from_json_schema(&tool.input_schema),
                handler: ToolHandler::Remote {
                    invoker: invoker.clone(),
                    remote_name: tool.name.clone(),
                },
                name: tool.name,
            })
            .collect())
    }
}

/// Extracts the JSON-RPC `result` from a plain JSON or event-stream body.
fn parse_rpc_body(content_type: &str, body: &str) -> Result<Value, String> {
    let payload = if content_type.starts_with("text/event-stream") {
        body.lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(str::trim)
            .filter(|data| data.starts_with('{'))
            .last()
            .ok_or_else(|| "event stream carried no data".to_string())?
    } else {
        body
    };

    let resp: RpcResponse =
        serde_json::from_str(payload).map_err(|err| format!("invalid response: {}", err))?;
    if let Some(err) = resp.error {
        return Err(format!("rpc error {}: {}", err.code, err.message));
    }
    resp.result.ok_or_else(|| "response carried no result".to_string())
}

fn parse_tool_list(result: &Value) -> Result<Vec<RemoteTool>, String> {
    let tools = result
        .get("tools")
        .cloned()
        .ok_or_else(|| "tools/list result has no 'tools' field".to_string())?;
    serde_json::from_value(tools).map_err(|err| format!("invalid tool list: {}", err))
}

/// Maps `tools/call` content parts to a single value.
///
/// Text parts holding JSON are decoded; several parts become an array.
fn parse_call_result(result: &Value) -> Result<Value, ToolError> {
    let parts: Vec<Value> = result
        .get("content")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .map(|part| match part.get("text").and_then(|v| v.as_str()) {
                    Some(text) => serde_json::from_str(text)
                        .unwrap_or_else(|_| Value::String(text.to_string())),
                    None => part.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    let is_error = result
        .get("isError")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if is_error {
        let message = parts
            .iter()
            .map(|part| match part {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ToolError::ExecutionFailed(message));
    }

    if let Some(structured) = result.get("structuredContent") {
        return Ok(structured.clone());
    }
    Ok(match parts.len() {
        0 => Value::Null,
        1 => parts.into_iter().next().unwrap_or(Value::Null),
        _ => Value::Array(parts),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Answers one connection per canned reply and hands back the raw requests.
    fn serve(replies: Vec<String>) -> (String, thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            for reply in replies {
                let (stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream);
                let mut request = String::new();
                let mut content_length = 0;
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).unwrap();
                    if let Some((key, value)) = line.split_once(':') {
                        if key.eq_ignore_ascii_case("content-length") {
                            content_length = value.trim().parse().unwrap();
                        }
                    }
                    let end_of_head = line == "\r\n" || line.is_empty();
                    request.push_str(&line);
                    if end_of_head {
                        break;
                    }
                }
                let mut body = vec![0; content_length];
                reader.read_exact(&mut body).unwrap();
                request.push_str(&String::from_utf8_lossy(&body));
                seen.push(request.to_ascii_lowercase());
                reader.get_mut().write_all(reply.as_bytes()).unwrap();
            }
            seen
        });
        (base_url, handle)
    }

    fn reply(status: &str, headers: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n{}\r\n{}",
            status,
            body.len(),
            headers,
            body
        )
    }

    #[test]
    fn parses_plain_json_body() {
        let body = r#"{"jsonrpc":"2.0","id":1,"result":{"ok":true}}"#;
        assert_eq!(parse_rpc_body("application/json", body).unwrap(), json!({"ok": true}));
    }

    #[test]
    fn parses_last_event_stream_message() {
        let body = "event: message\ndata: {\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{\"n\":1}}\n\n\
                    event: message\ndata: {\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{\"n\":2}}\n\n";
        assert_eq!(
            parse_rpc_body("text/event-stream; charset=utf-8", body).unwrap(),
            json!({"n": 2})
        );
    }

    #[test]
    fn rpc_error_is_reported() {
        let body = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"no such method"}}"#;
        let err = parse_rpc_body("application/json", body).unwrap_err();
        assert!(err.contains("no such method"));
    }

    #[test]
    fn parses_tool_list() {
        let result = json!({
            "tools": [{
                "name": "stk_push",
                "description": "Request an M-Pesa STK push",
                "inputSchema": {
                    "type": "object",
                    "properties": {"amount": {"type": "number"}, "phone_number": {"type": "string"}},
                    "required": ["amount", "phone_number"]
                }
            }]
        });
        let tools = parse_tool_list(&result).unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "stk_push");
        let schema = InputSchema::from_json_schema(&tools[0].input_schema);
        assert!(schema.validate(&json!({"amount": 10})).is_err());
    }

    #[test]
    fn tool_list_without_tools_field_fails() {
        assert!(parse_tool_list(&json!({})).is_err());
    }

    #[test]
    fn call_result_decodes_json_text() {
        let result = json!({"content": [{"type": "text", "text": "{\"status\":\"sent\"}"}]});
        assert_eq!(parse_call_result(&result).unwrap(), json!({"status": "sent"}));
    }

    #[test]
    fn call_result_keeps_plain_text() {
        let result = json!({"content": [{"type": "text", "text": "done"}]});
        assert_eq!(parse_call_result(&result).unwrap(), json!("done"));
    }

    #[test]
    fn call_result_error_flag_fails() {
        let result = json!({"isError": true, "content": [{"type": "text", "text": "insufficient funds"}]});
        assert_eq!(
            parse_call_result(&result).unwrap_err(),
            ToolError::ExecutionFailed("insufficient funds".to_string())
        );
    }

    #[test]
    fn missing_api_key_makes_provider_unavailable() {
        let provider = PayLinkProvider::new(PayLinkConfig::default()).unwrap();
        let err = provider.list_tools().unwrap_err();
        assert!(matches!(
            err,
            RegistryError::ProviderUnavailable { ref reason, .. } if reason.contains("PAYLINK_API_KEY")
        ));
    }

    #[test]
    fn unreachable_server_makes_provider_unavailable() {
        let provider = PayLinkProvider::new(PayLinkConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: Some("test-key".to_string()),
            payment_provider: Some("mpesa".to_string()),
            timeout_secs: 2,
        })
        .unwrap();
        let err = provider.list_tools().unwrap_err();
        assert!(matches!(err, RegistryError::ProviderUnavailable { ref provider, .. } if provider == PROVIDER_NAME));
    }

    #[test]
    fn handshake_lists_and_calls_remote_tools() {
        let (base_url, server) = serve(vec![
            reply(
                "200 OK",
                "mcp-session-id: sess-42\r\n",
                r#"{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05","serverInfo":{"name":"paylink","version":"1.0"}}}"#,
            ),
            reply("202 Accepted", "", ""),
            reply(
                "200 OK",
                "",
                r#"{"jsonrpc":"2.0","id":2,"result":{"tools":[{"name":"stk_push","description":"Request an M-Pesa STK push","inputSchema":{"type":"object","properties":{"amount":{"type":"number"},"phone_number":{"type":"string"}},"required":["amount","phone_number"]}}]}}"#,
            ),
            reply(
                "200 OK",
                "",
                r#"{"jsonrpc":"2.0","id":3,"result":{"content":[{"type":"text","text":"{\"status\":\"sent\"}"}]}}"#,
            ),
        ]);

        let provider = PayLinkProvider::new(PayLinkConfig {
            base_url,
            api_key: Some("test-key".to_string()),
            payment_provider: Some("mpesa".to_string()),
            timeout_secs: 5,
        })
        .unwrap();
        let tools = provider.list_tools().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "stk_push");
        assert!(matches!(
            tools[0].invoke(json!({"amount": 10})),
            Err(ToolError::InvalidArgument(_))
        ));
        let output = tools[0]
            .invoke(json!({"amount": 10, "phone_number": "0700000000"}))
            .unwrap();
        assert_eq!(output, json!({"status": "sent"}));

        let seen = server.join().unwrap();
        assert_eq!(seen.len(), 4);
        assert!(seen[0].contains(r#""method":"initialize""#));
        assert!(seen[0].contains("authorization: bearer test-key"));
        assert!(!seen[0].contains("mcp-session-id"));
        assert!(seen[1].contains("notifications/initialized"));
        for request in &seen[1..] {
            assert!(request.contains("mcp-session-id: sess-42"));
            assert!(request.contains("x-payment-provider: mpesa"));
        }
        assert!(seen[3].contains(r#""name":"stk_push""#));
    }
}
