use crate::helpers::{env_bool, env_float, env_opt, env_or, env_usize};
use crate::llm::{DEFAULT_MODEL, OPENAI_BASE_URL};
use crate::tools::paylink::{PayLinkConfig, DEFAULT_BASE_URL as PAYLINK_BASE_URL};

#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Chat model identifier, `provider:model` or a bare model name.
    pub model: String,
    pub max_iterations: usize,
    pub temperature: f64,
    pub openai_base_url: String,
    /// `None` leaves the payment tools out of the registry.
    pub paylink: Option<PayLinkConfig>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_iterations: 10,
            temperature: 0.3,
            openai_base_url: OPENAI_BASE_URL.to_string(),
            paylink: Some(PayLinkConfig::default()),
        }
    }
}

impl AgentConfig {
    pub fn from_env() -> Self {
        let defaults = AgentConfig::default();
        let paylink = if env_bool("PAYLINK_ENABLED", true) {
            Some(PayLinkConfig {
                base_url: env_or("PAYLINK_BASE_URL", PAYLINK_BASE_URL.to_string()),
                api_key: env_opt("PAYLINK_API_KEY"),
                payment_provider: env_opt("PAYLINK_PAYMENT_PROVIDER"),
                timeout_secs: env_usize("PAYLINK_TIMEOUT_SECS", 30) as u64,
            })
        } else {
            None
        };
        Self {
            model: env_or("AGENT_MODEL", defaults.model),
            max_iterations: env_usize("AGENT_MAX_ITERATIONS", defaults.max_iterations),
            temperature: env_float("AGENT_TEMPERATURE", defaults.temperature),
            openai_base_url: env_or("OPENAI_BASE_URL", defaults.openai_base_url),
            paylink,
        }
    }
}
