use std::env;
use std::sync::Arc;

use tracing::info;

use crate::agent::Agent;
use crate::config::AgentConfig;
use crate::error::{RegistryError, StartupError};
use crate::llm::{LLMRouter, ModelSpec, OpenAIAdapter, OpenAIConfig};
use crate::tools::{get_orders_tool, PayLinkProvider, ToolRegistry};

fn load_keys_from_env(primary: &str, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Ok(raw) = env::var(primary) {
        for item in raw.split(',') {
            let trimmed = item.trim();
            if !trimmed.is_empty() {
                keys.push(trimmed.to_string());
            }
        }
    }
    for idx in 2..=10 {
        let key = format!("{}_{}", prefix, idx);
        if let Ok(value) = env::var(&key) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                keys.push(trimmed.to_string());
            }
        }
    }
    keys
}

pub fn load_openai_keys() -> Vec<String> {
    load_keys_from_env("OPENAI_API_KEY", "OPENAI_API_KEY")
}

pub(crate) fn env_or(key: &str, fallback: String) -> String {
    env_opt(key).unwrap_or(fallback)
}

pub(crate) fn env_opt(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => None,
    }
}

pub(crate) fn env_bool(key: &str, fallback: bool) -> bool {
    match env_opt(key) {
        Some(value) => match value.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => fallback,
        },
        None => fallback,
    }
}

pub(crate) fn env_float(key: &str, fallback: f64) -> f64 {
    env_opt(key)
        .and_then(|value| value.parse::<f64>().ok())
        .unwrap_or(fallback)
}

pub(crate) fn env_usize(key: &str, fallback: usize) -> usize {
    env_opt(key)
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(fallback)
}

/// Builds the chat-model router for the configured model identifier.
pub fn build_llm_router(cfg: &AgentConfig) -> Result<(LLMRouter, ModelSpec), StartupError> {
    let spec = ModelSpec::parse(&cfg.model).map_err(|err| StartupError::Model(err.to_string()))?;
    let mut router = LLMRouter::new(&spec.provider);

    match spec.provider.as_str() {
        "openai" => {
            let keys = load_openai_keys();
            if keys.is_empty() {
                return Err(StartupError::Model(
                    "openai model selected but no OPENAI_API_KEY found".to_string(),
                ));
            }
            let adapter = OpenAIAdapter::new(OpenAIConfig {
                api_keys: keys,
                base_url: cfg.openai_base_url.clone(),
                model: spec.model.clone(),
                temperature: cfg.temperature,
            })
            .map_err(|err| StartupError::Model(err.to_string()))?;
            router.register_provider("openai", Arc::new(adapter));
        }
        other => {
            return Err(StartupError::Model(format!("unsupported model provider: {}", other)));
        }
    }

    Ok((router, spec))
}

/// Local tools followed by every configured provider's tools.
pub fn build_tool_registry(cfg: &AgentConfig) -> Result<ToolRegistry, RegistryError> {
    let mut builder = ToolRegistry::builder().tool(get_orders_tool());
    if let Some(paylink) = &cfg.paylink {
        builder = builder.provider(Arc::new(PayLinkProvider::new(paylink.clone())?));
    }
    builder.build()
}

/// Startup sequence: model, then tool registry, then the bound agent.
pub fn bind_agent(name: &str, cfg: AgentConfig, system_prompt: &str) -> Result<Agent, StartupError> {
    let (router, spec) = build_llm_router(&cfg)?;
    info!(model = %spec, "chat model initialized");
    let tools = build_tool_registry(&cfg)?;
    info!(tools = ?tools.names(), "tools bound to agent");
    Ok(Agent::new(name, cfg, system_prompt, router, Arc::new(tools)))
}
