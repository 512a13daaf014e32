use std::fmt;
use std::str::FromStr;

use super::types::ProviderError;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// A chat model identifier split into backend and model name.
///
/// Accepts `provider:model` or a bare model name whose backend is inferred
/// from well-known prefixes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelSpec {
    pub provider: String,
    pub model: String,
}

impl ModelSpec {
    pub fn parse(raw: &str) -> Result<Self, ProviderError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ProviderError::new("invalid_model", "empty model identifier", false));
        }
        if let Some((provider, model)) = raw.split_once(':') {
            let provider = provider.trim().to_lowercase();
            let model = model.trim();
            if provider.is_empty() || model.is_empty() {
                return Err(ProviderError::new(
                    "invalid_model",
                    &format!("malformed model identifier: {}", raw),
                    false,
                ));
            }
            return Ok(Self {
                provider,
                model: model.to_string(),
            });
        }
        let provider = infer_provider(raw).ok_or_else(|| {
            ProviderError::new(
                "invalid_model",
                &format!("cannot infer provider for model '{}', use provider:model", raw),
                false,
            )
        })?;
        Ok(Self {
            provider: provider.to_string(),
            model: raw.to_string(),
        })
    }
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl FromStr for ModelSpec {
    type Err = ProviderError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        ModelSpec::parse(raw)
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.model)
    }
}

fn infer_provider(model: &str) -> Option<&'static str> {
    let lowered = model.to_lowercase();
    ["gpt-", "o1", "o3", "o4", "chatgpt-"]
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
        .then_some("openai")
}
