//! Tool registry

use crate::Tool;
use std::sync::{Arc, PoisonError, RwLock};
use verdict_core::ToolCategory;
use verdict_llm::ToolDefinition;

/// Registry of available tools, kept in registration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<Vec<Arc<dyn Tool>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&self, tool: Arc<dyn Tool>) {
        let mut tools = self.tools.write().unwrap_or_else(PoisonError::into_inner);
        tools.retain(|t| t.name() != tool.name());
        tools.push(tool);
    }

    /// Builder-style registration
    pub fn with_tool(self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.read().iter().find(|t| t.name() == name).cloned()
    }

    /// First tool registered for a category
    pub fn for_category(&self, category: ToolCategory) -> Option<Arc<dyn Tool>> {
        self.read().iter().find(|t| t.category() == category).cloned()
    }

    pub fn has_category(&self, category: ToolCategory) -> bool {
        self.for_category(category).is_some()
    }

    pub fn list_tools(&self) -> Vec<Arc<dyn Tool>> {
        self.read().clone()
    }

    /// Definitions for the given tools, for the model
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.read().iter().map(|t| t.definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Arc<dyn Tool>>> {
        self.tools.read().unwrap_or_else(PoisonError::into_inner)
    }
}
