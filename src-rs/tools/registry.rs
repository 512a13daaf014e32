use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::types::{ToolDescriptor, ToolProvider, ToolResult, ToolSchema};
use crate::error::{RegistryError, ToolError};

/// Immutable set of tools available to the agent for one process lifetime.
///
/// Built once through [`ToolRegistryBuilder`]; there is no way to add, remove or
/// rename a tool afterwards.
#[derive(Debug)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::new()
    }

    /// Validates arguments and runs the named tool.
    pub fn invoke(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let entry = self
            .get(name)
            .ok_or_else(|| ToolError::ToolNotFound(name.to_string()))?;
        debug!(tool = name, "invoking tool");
        entry.invoke(args)
    }

    pub fn execute(&self, name: &str, args: Value) -> ToolResult {
        let outcome = self.invoke(name, args);
        if let Err(err) = &outcome {
            warn!(tool = name, error = %err, "tool invocation failed");
        }
        ToolResult::from_outcome(outcome)
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|idx| &self.tools[*idx])
    }

    /// Schemas in registry order.
    pub fn get_schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|entry| entry.schema()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn count(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Collects local tools and providers, then assembles a [`ToolRegistry`].
#[derive(Default)]
pub struct ToolRegistryBuilder {
    local: Vec<ToolDescriptor>,
    providers: Vec<Arc<dyn ToolProvider>>,
}

impl ToolRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tool(mut self, tool: ToolDescriptor) -> Self {
        self.local.push(tool);
        self
    }

    pub fn provider(mut self, provider: Arc<dyn ToolProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Local tools first, then each provider's tools in registration order.
    ///
    /// Any provider failure aborts the whole assembly.
    pub fn build(self) -> Result<ToolRegistry, RegistryError> {
        let mut tools = self.local;
        let local_count = tools.len();

        for provider in &self.providers {
            let listed = provider.list_tools().map_err(|err| match err {
                RegistryError::ProviderUnavailable { .. } => err,
                other => RegistryError::unavailable(provider.name(), other.to_string()),
            })?;
            info!(provider = provider.name(), tools = listed.len(), "provider tools listed");
            tools.extend(listed);
        }

        let mut index = HashMap::with_capacity(tools.len());
        for (idx, tool) in tools.iter().enumerate() {
            if tool.name.trim().is_empty() {
                return Err(RegistryError::InvalidTool(format!(
                    "tool at position {} has an empty name",
                    idx
                )));
            }
            if index.insert(tool.name.clone(), idx).is_some() {
                return Err(RegistryError::DuplicateTool(tool.name.clone()));
            }
        }

        info!(
            local = local_count,
            total = tools.len(),
            "tool registry assembled"
        );
        Ok(ToolRegistry { tools, index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::schema::{InputSchema, ParamKind, ParamSpec};
    use crate::tools::types::ToolHandler;
    use serde_json::json;

    fn echo(name: &str) -> ToolDescriptor {
        ToolDescriptor::new(
            name,
            "echoes its input",
            InputSchema::new().param(ParamSpec::new("text", ParamKind::String, "").required()),
            ToolHandler::local(|args| Ok(args["text"].clone())),
        )
    }

    struct StaticProvider {
        tools: Vec<&'static str>,
    }

    impl ToolProvider for StaticProvider {
        fn name(&self) -> &str {
            "static"
        }

        fn list_tools(&self) -> Result<Vec<ToolDescriptor>, RegistryError> {
            Ok(self.tools.iter().map(|name| echo(name)).collect())
        }
    }

    struct BrokenProvider;

    impl ToolProvider for BrokenProvider {
        fn name(&self) -> &str {
            "broken"
        }

        fn list_tools(&self) -> Result<Vec<ToolDescriptor>, RegistryError> {
            Err(RegistryError::unavailable("broken", "connection refused"))
        }
    }

    #[test]
    fn local_tools_come_before_provider_tools() {
        let registry = ToolRegistry::builder()
            .tool(echo("local_a"))
            .provider(Arc::new(StaticProvider {
                tools: vec!["remote_b", "remote_c"],
            }))
            .build()
            .unwrap();
        assert_eq!(registry.names(), vec!["local_a", "remote_b", "remote_c"]);
        assert_eq!(registry.count(), 3);
        let schemas: Vec<String> = registry.get_schemas().into_iter().map(|s| s.name).collect();
        assert_eq!(schemas, vec!["local_a", "remote_b", "remote_c"]);
    }

    #[test]
    fn duplicate_names_fail_assembly() {
        let err = ToolRegistry::builder()
            .tool(echo("same"))
            .provider(Arc::new(StaticProvider { tools: vec!["same"] }))
            .build()
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTool("same".to_string()));
    }

    #[test]
    fn empty_name_fails_assembly() {
        let err = ToolRegistry::builder().tool(echo(" ")).build().unwrap_err();
        assert!(matches!(err, RegistryError::InvalidTool(_)));
    }

    #[test]
    fn failing_provider_fails_whole_assembly() {
        let err = ToolRegistry::builder()
            .tool(echo("local_a"))
            .provider(Arc::new(StaticProvider { tools: vec!["ok"] }))
            .provider(Arc::new(BrokenProvider))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::ProviderUnavailable { ref provider, .. } if provider == "broken"
        ));
    }

    #[test]
    fn invoke_unknown_tool_is_not_found() {
        let registry = ToolRegistry::builder().tool(echo("echo")).build().unwrap();
        let err = registry.invoke("missing", json!({})).unwrap_err();
        assert_eq!(err, ToolError::ToolNotFound("missing".to_string()));
    }

    #[test]
    fn invoke_validates_before_handler() {
        let registry = ToolRegistry::builder().tool(echo("echo")).build().unwrap();
        assert_eq!(registry.invoke("echo", json!({"text": "hi"})).unwrap(), json!("hi"));
        assert!(matches!(
            registry.invoke("echo", json!({})),
            Err(ToolError::InvalidArgument(_))
        ));
    }

    #[test]
    fn execute_reports_error_code() {
        let registry = ToolRegistry::builder().tool(echo("echo")).build().unwrap();
        let result = registry.execute("nope", json!({}));
        assert!(!result.success);
        assert_eq!(result.error_code.as_deref(), Some("tool_not_found"));
    }
}
