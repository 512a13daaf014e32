pub mod agent;
pub mod config;
pub mod error;
pub mod helpers;
pub mod result;

#[path = "llm/lib.rs"]
pub mod llm;
#[path = "tools/lib.rs"]
pub mod tools;
#[path = "api/lib.rs"]
pub mod api;

pub use agent::{Agent, ExecuteOptions};
pub use config::AgentConfig;
pub use error::{RegistryError, StartupError, ToolError};
pub use helpers::{bind_agent, build_tool_registry};
pub use result::AgentResult;
