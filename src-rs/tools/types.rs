use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::schema::InputSchema;
use crate::error::{RegistryError, ToolError};

/// What the model sees of a tool.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Option<Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: Option<Value>,
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl ToolResult {
    pub fn from_outcome(outcome: Result<Value, ToolError>) -> Self {
        match outcome {
            Ok(output) => ToolResult {
                success: true,
                output: Some(output),
                error: None,
                error_code: None,
            },
            Err(err) => ToolResult {
                success: false,
                output: None,
                error: Some(err.to_string()),
                error_code: Some(err.code().to_string()),
            },
        }
    }
}

pub type LocalHandler = Arc<dyn Fn(Value) -> Result<Value, ToolError> + Send + Sync>;

/// Executes tools that live behind an external provider.
pub trait RemoteInvoker: Send + Sync {
    fn call_tool(&self, name: &str, args: Value) -> Result<Value, ToolError>;
}

#[derive(Clone)]
pub enum ToolHandler {
    Local(LocalHandler),
    Remote {
        invoker: Arc<dyn RemoteInvoker>,
        remote_name: String,
    },
}

impl ToolHandler {
    pub fn local<F>(f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, ToolError> + Send + Sync + 'static,
    {
        ToolHandler::Local(Arc::new(f))
    }

    pub fn call(&self, args: Value) -> Result<Value, ToolError> {
        match self {
            ToolHandler::Local(handler) => handler(args),
            ToolHandler::Remote {
                invoker,
                remote_name,
            } => invoker.call_tool(remote_name, args),
        }
    }
}

impl fmt::Debug for ToolHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolHandler::Local(_) => write!(f, "Local"),
            ToolHandler::Remote { remote_name, .. } => write!(f, "Remote({})", remote_name),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: InputSchema,
    pub handler: ToolHandler,
}

impl ToolDescriptor {
    pub fn new(name: &str, description: &str, input_schema: InputSchema, handler: ToolHandler) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
            handler,
        }
    }

    pub fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: Some(self.input_schema.to_json_schema()),
        }
    }

    /// Validates `args` against the input schema, then runs the handler.
    pub fn invoke(&self, args: Value) -> Result<Value, ToolError> {
        self.input_schema.validate(&args)?;
        self.handler.call(args)
    }
}

/// An external integration that contributes tools to the registry.
pub trait ToolProvider: Send + Sync {
    fn name(&self) -> &str;

    fn list_tools(&self) -> Result<Vec<ToolDescriptor>, RegistryError>;
}
