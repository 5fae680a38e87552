//! Active Tool Registry (§4.8, component C10).
//!
//! Process-wide, shared by every session. A tool invocation registers
//! itself here before doing any work and receives a [`CancellationToken`]
//! it must poll between I/O steps; the Interruption Handler (C9) and the
//! Decision Task (C4) call [`ActiveToolRegistry::cancel_all`] to pre-empt
//! every in-flight tool when a turn is abandoned.

use std::collections::HashMap;
use std::time::Instant;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

struct ToolEntry {
    name: String,
    started_at: Instant,
    cancel: CancellationToken,
    was_cancelled: bool,
    metadata: serde_json::Value,
}

/// A point-in-time snapshot of one registered tool, for `list()`.
#[derive(Debug, Clone)]
pub struct ToolSnapshot {
    pub tool_id: String,
    pub tool_name: String,
    pub running_for_ms: u128,
    pub was_cancelled: bool,
    pub metadata: serde_json::Value,
}

#[derive(Default)]
pub struct ActiveToolRegistry {
    entries: RwLock<HashMap<String, ToolEntry>>,
}

impl ActiveToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tool execution and hand back its id plus the
    /// cancellation token the tool body should poll.
    pub fn register(
        &self,
        tool_name: impl Into<String>,
        metadata: serde_json::Value,
    ) -> (String, CancellationToken) {
        let tool_id = Uuid::new_v4().to_string();
        let cancel = CancellationToken::new();
        let entry = ToolEntry {
            name: tool_name.into(),
            started_at: Instant::now(),
            cancel: cancel.clone(),
            was_cancelled: false,
            metadata,
        };
        tracing::debug!(tool_id = %tool_id, tool_name = %entry.name, "registered tool");
        self.entries.write().insert(tool_id.clone(), entry);
        (tool_id, cancel)
    }

    /// Mark a tool execution complete and remove it from the registry.
    pub fn unregister(&self, tool_id: &str) -> bool {
        let mut entries = self.entries.write();
        if let Some(entry) = entries.remove(tool_id) {
            tracing::debug!(
                tool_id = %tool_id,
                tool_name = %entry.name,
                running_for_ms = entry.started_at.elapsed().as_millis(),
                "unregistered tool"
            );
            true
        } else {
            false
        }
    }

    /// Cancel a single tool. Idempotent: returns `false` if the tool is
    /// unknown or was already cancelled.
    pub fn cancel(&self, tool_id: &str) -> bool {
        let mut entries = self.entries.write();
        match entries.get_mut(tool_id) {
            Some(entry) if !entry.was_cancelled => {
                entry.cancel.cancel();
                entry.was_cancelled = true;
                true
            }
            _ => false,
        }
    }

    /// Cancel every live entry (§4.2 step 8, §4.4 step 1). Returns the
    /// number of tools actually cancelled.
    pub fn cancel_all(&self) -> usize {
        let mut entries = self.entries.write();
        let mut cancelled = 0;
        for entry in entries.values_mut() {
            if !entry.was_cancelled {
                entry.cancel.cancel();
                entry.was_cancelled = true;
                cancelled += 1;
            }
        }
        if cancelled > 0 {
            tracing::info!(cancelled, "cancelled all active tools");
        }
        cancelled
    }

    pub fn list(&self) -> Vec<ToolSnapshot> {
        self.entries
            .read()
            .iter()
            .map(|(id, e)| ToolSnapshot {
                tool_id: id.clone(),
                tool_name: e.name.clone(),
                running_for_ms: e.started_at.elapsed().as_millis(),
                was_cancelled: e.was_cancelled,
                metadata: e.metadata.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_unregister_empties_registry() {
        let reg = ActiveToolRegistry::new();
        let (id, _cancel) = reg.register("demo", serde_json::json!({}));
        assert_eq!(reg.len(), 1);
        assert!(reg.unregister(&id));
        assert!(reg.is_empty());
    }

    #[test]
    fn cancel_is_idempotent() {
        let reg = ActiveToolRegistry::new();
        let (id, cancel) = reg.register("demo", serde_json::json!({}));
        assert!(reg.cancel(&id));
        assert!(cancel.is_cancelled());
        assert!(!reg.cancel(&id), "second cancel must be a no-op");
    }

    #[test]
    fn cancel_unknown_id_returns_false() {
        let reg = ActiveToolRegistry::new();
        assert!(!reg.cancel("nonexistent"));
    }

    #[test]
    fn cancel_all_cancels_every_live_entry() {
        let reg = ActiveToolRegistry::new();
        let (_id1, c1) = reg.register("a", serde_json::json!({}));
        let (_id2, c2) = reg.register("b", serde_json::json!({}));
        let cancelled = reg.cancel_all();
        assert_eq!(cancelled, 2);
        assert!(c1.is_cancelled());
        assert!(c2.is_cancelled());
    }

    #[test]
    fn cancel_all_on_empty_registry_returns_zero() {
        let reg = ActiveToolRegistry::new();
        assert_eq!(reg.cancel_all(), 0);
    }

    #[test]
    fn list_reports_snapshot_fields() {
        let reg = ActiveToolRegistry::new();
        reg.register("demo", serde_json::json!({"k": "v"}));
        let snaps = reg.list();
        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].tool_name, "demo");
        assert!(!snaps[0].was_cancelled);
    }
}
