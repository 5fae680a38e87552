//! The tool table the Agent Runner (C5) dispatches into (§4.6's "tool
//! interface": `invoke(name, args, ctx) -> string-summary`). Bridges the
//! LLM's tool-call loop to `bargein-tools`' process-wide registry and
//! background scheduler.

use std::collections::HashMap;
use std::sync::Arc;

use bargein_domain::tool::ToolDefinition;
use bargein_tools::reserve_slot::{reserve_slot, SlotBackend};
use bargein_tools::BackgroundToolScheduler;

#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;
    async fn invoke(&self, args: serde_json::Value, scheduler: &BackgroundToolScheduler) -> String;
}

/// Demo [`SlotBackend`]: logs confirm/release instead of calling out to a
/// real booking system.
struct LoggingSlotBackend;

#[async_trait::async_trait]
impl SlotBackend for LoggingSlotBackend {
    async fn confirm(&self, slot_id: &str) {
        tracing::info!(slot_id, "reservation confirmed");
    }
    async fn release(&self, slot_id: &str) {
        tracing::info!(slot_id, "reservation released (cancelled before confirmation)");
    }
}

/// `reserve_slot` wired up as an LLM-callable tool (§4.9's async-tool
/// pattern, exercised end to end).
struct ReserveSlotTool {
    backend: Arc<dyn SlotBackend>,
}

#[async_trait::async_trait]
impl Tool for ReserveSlotTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "reserve_slot".into(),
            description: "Reserve a booking slot, held for a few seconds pending confirmation."
                .into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "slot_id": { "type": "string", "description": "Identifier of the slot to reserve" }
                },
                "required": ["slot_id"]
            }),
        }
    }

    async fn invoke(&self, args: serde_json::Value, scheduler: &BackgroundToolScheduler) -> String {
        let slot_id = args
            .get("slot_id")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();
        let handle = reserve_slot(scheduler, self.backend.clone(), slot_id.clone());
        format!("Slot '{slot_id}' held, tracking id {handle}")
    }
}

/// The small, fixed set of tools the Agent Runner may call.
pub struct ToolTable {
    tools: HashMap<String, Arc<dyn Tool>>,
    scheduler: BackgroundToolScheduler,
}

impl ToolTable {
    pub fn new(scheduler: BackgroundToolScheduler) -> Self {
        let mut tools: HashMap<String, Arc<dyn Tool>> = HashMap::new();
        tools.insert(
            "reserve_slot".into(),
            Arc::new(ReserveSlotTool { backend: Arc::new(LoggingSlotBackend) }),
        );
        Self { tools, scheduler }
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    pub async fn invoke(&self, name: &str, args: serde_json::Value) -> String {
        match self.tools.get(name) {
            Some(tool) => tool.invoke(args, &self.scheduler).await,
            None => format!("error: unknown tool '{name}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bargein_tools::ActiveToolRegistry;

    fn table() -> ToolTable {
        let registry = Arc::new(ActiveToolRegistry::new());
        ToolTable::new(BackgroundToolScheduler::new(registry))
    }

    #[tokio::test]
    async fn reserve_slot_tool_returns_a_tracking_handle() {
        let result = table().invoke("reserve_slot", serde_json::json!({"slot_id": "s1"})).await;
        assert!(result.contains("s1"));
    }

    #[tokio::test]
    async fn unknown_tool_returns_an_error_string() {
        let result = table().invoke("nope", serde_json::json!({})).await;
        assert!(result.contains("unknown tool"));
    }

    #[test]
    fn definitions_includes_reserve_slot() {
        let defs = table().definitions();
        assert!(defs.iter().any(|d| d.name == "reserve_slot"));
    }
}
