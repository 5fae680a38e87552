//! Interruption Handler — the pause reaction (§4.2, component C9).

use bargein_domain::trace::TraceEvent;
use bargein_protocol::ServerEvent;
use bargein_session::{InterruptionStatus, PlaybackStatus, StageStatus};

use crate::runtime::coordinator::Coordinator;

impl Coordinator {
    /// Triggered synchronously by `speech_start`. "React fast, decide
    /// later": pause and tear down anything stale immediately; the
    /// Decision Task (§4.4) resolves whether this was a real interruption
    /// once the new transcript (or lack of one) arrives.
    pub(crate) async fn pause_reaction(&mut self) {
        if self.session.is_fully_idle() {
            // Start of a fresh turn, not an interruption of anything.
            return;
        }

        self.session.interruption_status = InterruptionStatus::Processing;
        self.session.client_was_active_before_interruption = self.session.client_playback_active;

        self.send(ServerEvent::StopPlayback { message: None }).await;
        self.session.playback_status = PlaybackStatus::Paused;

        // Audio captured before this point is stale; a fresh buffer
        // arrives once the client's VAD re-opens the microphone.
        self.stt_queue.clear();
        self.session.stt_output_list.clear();

        // Abandon any sentences not yet vocalized. The audio queue is
        // left alone: frames already synthesized stay available in case
        // the Decision Task resumes instead of regenerating.
        while self.text_rx.try_recv().is_ok() {}

        let cancelled = self.tool_registry.cancel_all();
        if cancelled > 0 {
            tracing::info!(session_id = %self.session.id, cancelled, "interruption cancelled in-flight tools");
        }

        let mut agent_was_cancelled = false;
        if self.session.agent_status == StageStatus::Processing {
            if let Some(cancel) = self.agent_cancel.take() {
                cancel.cancel();
            }
            self.session.agent_status = StageStatus::Idle;
            self.session.tts_status = StageStatus::Idle;
            agent_was_cancelled = true;
        }
        // If STREAMING: let it finish. Its output is discarded by the
        // generation-id filter once the Decision Task regenerates.

        self.session.interruption_status = InterruptionStatus::Active;

        TraceEvent::InterruptionHandled {
            session_id: self.session.id.clone(),
            generation_id: self.session.generation_id,
            agent_was_cancelled,
            tools_cancelled: cancelled,
        }
        .emit();
    }
}
