//! Tool capabilities the agent may invoke and the registry that dispatches them.

mod work_order;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub use work_order::CreateWorkOrder;

/// String arguments parsed from a tool-call directive.
pub type ToolArgs = HashMap<String, String>;

/// Serializable value returned by a tool.
pub type ToolResult = Value;

/// A capability the model can request through a tool-call directive.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name, matched case-insensitively.
    fn name(&self) -> &str;

    /// Short description embedded into the prompt catalog.
    fn description(&self) -> &str;

    /// Run the tool. Implementations should stop early when `cancel` fires.
    async fn execute(&self, args: &ToolArgs, cancel: &CancellationToken) -> anyhow::Result<ToolResult>;
}

/// Name and description of a registered tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool {name} failed: {source}")]
    Failed {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Registry of available tools, in registration order.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a registry with the built-in tools.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(CreateWorkOrder));
        registry
    }

    /// Create a registry with no tools.
    pub fn empty() -> Self {
        Self { tools: Vec::new() }
    }

    /// Add a tool, replacing any tool with the same case-insensitive name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        match self.position(tool.name()) {
            Some(index) => self.tools[index] = tool,
            None => self.tools.push(tool),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.tools
            .iter()
            .position(|t| t.name().eq_ignore_ascii_case(name))
    }

    /// Look up a tool by case-insensitive name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.position(name).map(|index| Arc::clone(&self.tools[index]))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .map(|t| ToolDescriptor {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    /// Render one `- name: description` line per tool.
    pub fn catalog(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("- {}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Execute a tool by name.
    ///
    /// # Errors
    ///
    /// `DispatchError::UnknownTool` if nothing is registered under `name`,
    /// `DispatchError::Failed` if the tool itself returns an error.
    pub async fn dispatch(
        &self,
        name: &str,
        args: &ToolArgs,
        cancel: &CancellationToken,
    ) -> Result<ToolResult, DispatchError> {
        let tool = self
            .get(name)
            .ok_or_else(|| DispatchError::UnknownTool(name.to_string()))?;

        tracing::info!(tool = %tool.name(), ?args, "Executing tool");

        tool.execute(args, cancel)
            .await
            .map_err(|source| DispatchError::Failed {
                name: tool.name().to_string(),
                source,
            })
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Return the arguments unchanged."
        }

        async fn execute(&self, args: &ToolArgs, _cancel: &CancellationToken) -> anyhow::Result<ToolResult> {
            Ok(json!(args))
        }
    }

    struct Broken;

    #[async_trait]
    impl Tool for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn description(&self) -> &str {
            "Always fails."
        }

        async fn execute(&self, _args: &ToolArgs, _cancel: &CancellationToken) -> anyhow::Result<ToolResult> {
            Err(anyhow::anyhow!("backend unavailable"))
        }
    }

    #[test]
    fn catalog_lists_tools_in_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo));

        assert_eq!(
            registry.catalog(),
            "- create_work_order: Create a maintenance work order. Args: equipmentId (string), summary (string), priority (Low|Medium|High).\n- echo: Return the arguments unchanged."
        );
    }

    #[test]
    fn empty_registry_has_empty_catalog() {
        assert_eq!(ToolRegistry::empty().catalog(), "");
    }

    #[test]
    fn register_replaces_same_name() {
        let mut registry = ToolRegistry::empty();
        registry.register(Arc::new(Echo));
        registry.register(Arc::new(Echo));
        assert_eq!(registry.list_tools().len(), 1);
    }

    #[tokio::test]
    async fn dispatch_is_case_insensitive() {
        let mut registry = ToolRegistry::empty();
        registry.register(Arc::new(Echo));
        let args = ToolArgs::from([("k".to_string(), "v".to_string())]);

        let result = registry
            .dispatch("ECHO", &args, &CancellationToken::new())
            .await
            .expect("dispatch");
        assert_eq!(result, json!({"k": "v"}));
    }

    #[tokio::test]
    async fn dispatch_reports_unknown_tool() {
        let registry = ToolRegistry::empty();
        let err = registry
            .dispatch("delete_plant", &ToolArgs::new(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnknownTool(ref name) if name == "delete_plant"));
        assert_eq!(err.to_string(), "Unknown tool: delete_plant");
    }

    #[tokio::test]
    async fn dispatch_wraps_tool_failures() {
        let mut registry = ToolRegistry::empty();
        registry.register(Arc::new(Broken));
        let err = registry
            .dispatch("broken", &ToolArgs::new(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Failed { ref name, .. } if name == "broken"));
    }
}
