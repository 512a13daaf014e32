pub use crate::agent::{Agent, ExecuteOptions};
pub use crate::config::AgentConfig;
pub use crate::result::{AgentResult, ToolTrace};
pub use crate::tools::{ToolRegistry, ToolResult, ToolSchema};

pub mod handlers;
pub mod server;
