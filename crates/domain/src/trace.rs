use serde::Serialize;

/// Structured trace events emitted across the orchestrator for anything
/// worth grepping out of JSON logs without adding a metrics backend.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    SessionOpened {
        session_id: String,
    },
    SessionClosed {
        session_id: String,
        reason: String,
    },
    InterruptionHandled {
        session_id: String,
        generation_id: u64,
        agent_was_cancelled: bool,
        tools_cancelled: usize,
    },
    DecisionResolved {
        session_id: String,
        outcome: String,
        is_false_alarm: bool,
    },
    TurnStarted {
        session_id: String,
        generation_id: u64,
    },
    TurnDiscarded {
        session_id: String,
        generation_id: u64,
        current_generation_id: u64,
    },
    ProviderCall {
        session_id: String,
        provider: String,
        duration_ms: u64,
        status: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "bargein_event");
    }
}
