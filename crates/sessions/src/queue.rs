//! Item types for the three per-session queues (§3 Queues, §5 Backpressure).
//!
//! The queues themselves are plain `tokio::sync::mpsc` channels owned by
//! the coordinator in `bargein-gateway::runtime` — this module only
//! defines what flows through them and the generation-id tagging used to
//! drop stale items (§5 Ordering guarantees).

/// A sentence flushed by the Agent Runner onto `textStreamQueue`, or the
/// end-of-stream sentinel for one generation.
#[derive(Debug, Clone)]
pub enum TextStreamItem {
    Sentence { generation_id: u64, text: String },
    EndOfStream { generation_id: u64 },
}

impl TextStreamItem {
    pub fn generation_id(&self) -> u64 {
        match self {
            TextStreamItem::Sentence { generation_id, .. }
            | TextStreamItem::EndOfStream { generation_id } => *generation_id,
        }
    }
}

/// A synthesized frame pushed by the TTS Worker onto `audioOutputQueue`,
/// or the end-of-stream sentinel for one generation.
#[derive(Debug, Clone)]
pub enum AudioOutputItem {
    Frame { generation_id: u64, audio_base64: String },
    EndOfStream { generation_id: u64 },
}

impl AudioOutputItem {
    pub fn generation_id(&self) -> u64 {
        match self {
            AudioOutputItem::Frame { generation_id, .. }
            | AudioOutputItem::EndOfStream { generation_id } => *generation_id,
        }
    }
}

/// Drop items whose `generation_id` is behind the session's current one
/// (§5: "items tagged with stale generationId are silently dropped").
pub fn is_stale(item_generation_id: u64, current_generation_id: u64) -> bool {
    item_generation_id < current_generation_id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn older_generation_is_stale() {
        assert!(is_stale(3, 5));
    }

    #[test]
    fn current_generation_is_not_stale() {
        assert!(!is_stale(5, 5));
    }

    #[test]
    fn newer_generation_is_not_stale() {
        assert!(!is_stale(6, 5));
    }
}
