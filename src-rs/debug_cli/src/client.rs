use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

use crate::models::{ExecuteRequest, ExecuteResponse, InvokeResponse, ToolInfo};

pub struct HTTPClient {
    pub base_url: String,
    pub token: Option<String>,
    client: Client,
}

impl HTTPClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|err| err.to_string())?;
        Ok(Self {
            base_url: base_url.to_string(),
            token,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &self.token {
            if let Ok(header) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, header);
            }
        }
        headers
    }

    pub fn execute(&self, req: ExecuteRequest) -> Result<ExecuteResponse, String> {
        let resp = self
            .client
            .post(self.url("/execute"))
            .headers(self.headers())
            .json(&req)
            .send()
            .map_err(|err| err.to_string())?;

        if resp.status().is_success() {
            resp.json::<ExecuteResponse>().map_err(|err| err.to_string())
        } else {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            Err(format!("http {}: {}", status.as_u16(), body))
        }
    }

    pub fn list_tools(&self) -> Result<Vec<ToolInfo>, String> {
        let resp = self
            .client
            .get(self.url("/tools"))
            .headers(self.headers())
            .send()
            .map_err(|err| err.to_string())?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(format!("http {}: {}", status.as_u16(), body));
        }
        let value = resp.json::<Value>().map_err(|err| err.to_string())?;
        let tools = value.get("tools").cloned().unwrap_or(Value::Array(Vec::new()));
        serde_json::from_value(tools).map_err(|err| err.to_string())
    }

    /// Error statuses still carry a JSON body describing the tool failure.
    pub fn invoke(&self, name: &str, args: Value) -> Result<InvokeResponse, String> {
        let resp = self
            .client
            .post(self.url(&format!("/tools/{}/invoke", name)))
            .headers(self.headers())
            .json(&args)
            .send()
            .map_err(|err| err.to_string())?;
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        serde_json::from_str::<InvokeResponse>(&body)
            .map_err(|_| format!("http {}: {}", status.as_u16(), body))
    }
}
