//! Background Tool Scheduler (§4.9, component C11).
//!
//! A single long-lived execution context shared by every session: tool
//! bodies are driven synchronously by the LLM runtime and need a host to
//! keep running in after the tool call itself has returned its summary to
//! the model. `tokio::spawn` already gives us exactly that host, so this
//! scheduler is a thin wrapper around the register/spawn/unregister
//! sequence rather than a dedicated event loop.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::registry::ActiveToolRegistry;

#[derive(Clone)]
pub struct BackgroundToolScheduler {
    registry: Arc<ActiveToolRegistry>,
}

impl BackgroundToolScheduler {
    pub fn new(registry: Arc<ActiveToolRegistry>) -> Self {
        Self { registry }
    }

    /// Run the async-tool pattern (§4.9 steps 1-4): register with the
    /// registry, spawn `body` with the cancellation token it should poll,
    /// unregister once it completes, and hand back a short tracking
    /// handle (the tool-id's first 8 characters) immediately — the
    /// caller does not await the background work.
    pub fn spawn<F, Fut>(&self, tool_name: impl Into<String>, metadata: serde_json::Value, body: F) -> String
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let tool_name = tool_name.into();
        let (tool_id, cancel) = self.registry.register(tool_name.clone(), metadata);
        let handle = tool_id.chars().take(8).collect::<String>();

        let registry = self.registry.clone();
        let task_id = tool_id.clone();
        let span = tracing::info_span!("tool.background", tool_name = %tool_name, tool_id = %tool_id);
        tokio::spawn(
            async move {
                body(cancel).await;
                registry.unregister(&task_id);
            }
            .instrument(span),
        );

        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn spawned_body_runs_and_self_unregisters() {
        let registry = Arc::new(ActiveToolRegistry::new());
        let scheduler = BackgroundToolScheduler::new(registry.clone());
        let ran = Arc::new(AtomicBool::new(false));

        let ran_clone = ran.clone();
        let handle = scheduler.spawn("demo", serde_json::json!({}), move |_cancel| async move {
            ran_clone.store(true, Ordering::SeqCst);
        });
        assert_eq!(handle.len(), 8);

        // give the spawned task a chance to run and unregister
        for _ in 0..50 {
            if registry.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        assert!(ran.load(Ordering::SeqCst));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn cancelling_the_tool_signals_the_body() {
        let registry = Arc::new(ActiveToolRegistry::new());
        let scheduler = BackgroundToolScheduler::new(registry.clone());
        let cancelled_seen = Arc::new(AtomicBool::new(false));

        let cancelled_seen_clone = cancelled_seen.clone();
        scheduler.spawn("demo", serde_json::json!({}), move |cancel| async move {
            cancel.cancelled().await;
            cancelled_seen_clone.store(true, Ordering::SeqCst);
        });

        for _ in 0..50 {
            if registry.len() == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        let cancelled = registry.cancel_all();
        assert_eq!(cancelled, 1);

        for _ in 0..50 {
            if cancelled_seen.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(cancelled_seen.load(Ordering::SeqCst));
    }
}
