//! Name-keyed tool registry with last-write-wins collision handling.

use std::sync::Arc;

use mcommon::Registry;

use crate::{Tool, ToolDefinition};

/// Ordered collection of tools keyed by name.
///
/// Registration order is preserved for definitions sent to the backend;
/// registering a second tool under an existing name replaces the first in
/// place. The invocation loop builds one registry per loop call.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Registry<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tools(tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        let mut registry = Self::new();
        for tool in tools {
            registry.register_arc(tool);
        }
        registry
    }

    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.register_arc(Arc::new(tool));
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.remove(name)
    }

    /// Definitions in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use mcommon::CancellationToken;
    use serde_json::{Value, json};

    use super::*;
    use crate::{FunctionTool, ToolDefinition};

    fn tool_returning(name: &str, value: Value) -> FunctionTool {
        FunctionTool::new(
            ToolDefinition::new(name, "test tool", json!({"type": "object"})),
            move |_args, _cancel| {
                let value = value.clone();
                async move { Ok(value) }
            },
        )
    }

    #[tokio::test]
    async fn later_registration_wins_on_name_collision() {
        let mut registry = ToolRegistry::new();
        registry.register(tool_returning("lookup", json!("first")));
        registry.register(tool_returning("other", json!("other")));
        registry.register(tool_returning("lookup", json!("second")));

        assert_eq!(registry.len(), 2);

        let tool = registry.get("lookup").expect("tool should resolve");
        let result = tool
            .invoke("{}", &CancellationToken::new())
            .await
            .expect("invocation should succeed");
        assert_eq!(result, json!("second"));

        // The replaced tool keeps its original slot in definition order.
        let names: Vec<String> = registry
            .definitions()
            .into_iter()
            .map(|definition| definition.name)
            .collect();
        assert_eq!(names, vec!["lookup", "other"]);
    }

    #[test]
    fn registry_tracks_registration_lifecycle() {
        let mut registry = ToolRegistry::new();
        assert!(registry.is_empty());

        registry.register(tool_returning("echo", json!(null)));
        assert!(registry.contains("echo"));
        assert_eq!(registry.definitions().len(), 1);

        assert!(registry.remove("echo").is_some());
        assert!(registry.is_empty());
        assert!(registry.get("echo").is_none());
    }
}
