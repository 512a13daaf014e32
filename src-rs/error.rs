use thiserror::Error;

/// Errors surfaced by a single tool invocation.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ToolError {
    /// Arguments failed schema validation or a value was outside its enumeration.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No tool with this name is registered.
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// The handler ran but could not produce a result.
    #[error("tool execution failed: {0}")]
    ExecutionFailed(String),
}

impl ToolError {
    pub fn code(&self) -> &'static str {
        match self {
            ToolError::InvalidArgument(_) => "invalid_argument",
            ToolError::ToolNotFound(_) => "tool_not_found",
            ToolError::ExecutionFailed(_) => "execution_failed",
        }
    }
}

/// Errors raised while assembling the tool registry.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RegistryError {
    /// A provider could not enumerate its tools. Fatal to startup.
    #[error("tool provider '{provider}' unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    #[error("duplicate tool name: {0}")]
    DuplicateTool(String),

    #[error("invalid tool: {0}")]
    InvalidTool(String),
}

impl RegistryError {
    pub fn unavailable(provider: &str, reason: impl Into<String>) -> Self {
        RegistryError::ProviderUnavailable {
            provider: provider.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors that stop the agent from being bound at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("chat model unavailable: {0}")]
    Model(String),
}
