use std::env;

use crate::models::CLIConfig;

const DEFAULT_URL: &str = "http://localhost:8080";

pub fn parse_config() -> CLIConfig {
    let mut cfg = CLIConfig {
        base_url: env_or("PAYLINK_AGENT_URL", DEFAULT_URL.to_string()),
        model: env_opt("PAYLINK_AGENT_MODEL"),
        system_prompt: env_opt("PAYLINK_AGENT_SYSTEM_PROMPT"),
        temperature: env_float("PAYLINK_AGENT_TEMPERATURE", 0.3),
        debug: env_bool("PAYLINK_AGENT_DEBUG", false),
        token: env_opt("PAYLINK_AGENT_TOKEN"),
    };

    let args: Vec<String> = env::args().collect();
    let mut idx = 1;
    while idx < args.len() {
        let value = args.get(idx + 1);
        match (args[idx].as_str(), value) {
            ("--base", Some(value)) => {
                cfg.base_url = value.clone();
                idx += 1;
            }
            ("--model", Some(value)) => {
                cfg.model = Some(value.clone());
                idx += 1;
            }
            ("--system", Some(value)) => {
                cfg.system_prompt = Some(value.clone());
                idx += 1;
            }
            ("--temp", Some(value)) => {
                if let Ok(parsed) = value.parse::<f64>() {
                    cfg.temperature = parsed;
                }
                idx += 1;
            }
            ("--token", Some(value)) => {
                cfg.token = Some(value.clone());
                idx += 1;
            }
            ("--debug", Some(value)) if !value.starts_with('-') => {
                cfg.debug = value.parse::<bool>().unwrap_or(true);
                idx += 1;
            }
            ("--debug", _) => cfg.debug = true,
            _ => {}
        }
        idx += 1;
    }

    cfg
}

fn env_or(key: &str, fallback: String) -> String {
    env::var(key).unwrap_or(fallback)
}

fn env_opt(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

fn env_bool(key: &str, fallback: bool) -> bool {
    match env::var(key) {
        Ok(value) => value.parse::<bool>().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_float(key: &str, fallback: f64) -> f64 {
    match env::var(key) {
        Ok(value) => value.parse::<f64>().unwrap_or(fallback),
        Err(_) => fallback,
    }
}
