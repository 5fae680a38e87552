//! Example tool built on the async-tool pattern (§4.9): reserves a slot in
//! some external booking system, then confirms it a few seconds later
//! once the user has had time to change their mind. If the tool is
//! cancelled before confirmation — because the turn that invoked it was
//! abandoned (§4.4) — the reservation is released instead of confirmed.
//!
//! Stands in for any tool whose useful work outlives the single
//! synchronous call the LLM makes: the call returns a tracking handle
//! immediately, and the confirm-or-release decision happens later on the
//! background scheduler.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::scheduler::BackgroundToolScheduler;

/// Confirms or releases a reservation. Swapped for a real booking-system
/// client in production; a stub or mock in tests.
#[async_trait::async_trait]
pub trait SlotBackend: Send + Sync {
    async fn confirm(&self, slot_id: &str);
    async fn release(&self, slot_id: &str);
}

/// How long to hold the slot open before confirming it, absent a cancel.
const HOLD_DURATION: Duration = Duration::from_secs(5);

/// Reserve `slot_id` and schedule its confirmation. Returns the 8-char
/// tracking handle described in §4.9 step 4; the caller does not wait for
/// confirmation to complete.
pub fn reserve_slot(
    scheduler: &BackgroundToolScheduler,
    backend: Arc<dyn SlotBackend>,
    slot_id: String,
) -> String {
    let metadata = serde_json::json!({ "slot_id": slot_id });
    scheduler.spawn("reserve_slot", metadata, move |cancel: CancellationToken| async move {
        tokio::select! {
            _ = tokio::time::sleep(HOLD_DURATION) => {
                backend.confirm(&slot_id).await;
            }
            _ = cancel.cancelled() => {
                backend.release(&slot_id).await;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ActiveToolRegistry;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct RecordingBackend {
        confirmed: Arc<AtomicBool>,
        released: Arc<AtomicBool>,
    }

    #[async_trait::async_trait]
    impl SlotBackend for RecordingBackend {
        async fn confirm(&self, _slot_id: &str) {
            self.confirmed.store(true, Ordering::SeqCst);
        }
        async fn release(&self, _slot_id: &str) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn cancel_before_hold_expires_releases_the_slot() {
        let registry = Arc::new(ActiveToolRegistry::new());
        let scheduler = BackgroundToolScheduler::new(registry.clone());
        let confirmed = Arc::new(AtomicBool::new(false));
        let released = Arc::new(AtomicBool::new(false));
        let backend = Arc::new(RecordingBackend {
            confirmed: confirmed.clone(),
            released: released.clone(),
        });

        let handle = reserve_slot(&scheduler, backend, "slot-1".into());
        assert_eq!(handle.len(), 8);

        for _ in 0..50 {
            if registry.len() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        registry.cancel_all();

        for _ in 0..50 {
            if registry.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(released.load(Ordering::SeqCst));
        assert!(!confirmed.load(Ordering::SeqCst));
    }
}
