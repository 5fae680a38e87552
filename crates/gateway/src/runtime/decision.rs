//! Decision Task (§4.4, component C4) — the heart of the orchestrator.
//! Resolves a debounce window into resume, regenerate, or
//! regenerate-from-reset.

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use bargein_domain::trace::TraceEvent;
use bargein_protocol::ServerEvent;
use bargein_session::{ChatMessage, ChatRole, InterruptionStatus, PlaybackStatus, StageStatus};

use crate::runtime::coordinator::Coordinator;

impl Coordinator {
    /// Cancel any outstanding debounce and start a new one. Only the last
    /// scheduled Decision Task ever fires past the sleep (invariant 1).
    pub(crate) fn schedule_decision(&mut self) {
        if let Some(cancel) = self.decision_cancel.take() {
            cancel.cancel();
        }
        let cancel = CancellationToken::new();
        self.decision_cancel = Some(cancel.clone());

        let debounce_ms = self.config.session.debounce_ms;
        let tx = self.decision_tx();
        let span = tracing::info_span!("decision.debounce", session_id = %self.session.id);
        tokio::spawn(
            async move {
                tokio::select! {
                    _ = sleep(std::time::Duration::from_millis(debounce_ms)) => {
                        let _ = tx.send(()).await;
                    }
                    _ = cancel.cancelled() => {}
                }
            }
            .instrument(span),
        );
    }

    /// Runs once the debounce has elapsed uncancelled.
    pub(crate) async fn run_decision(&mut self) {
        self.decision_cancel = None;

        // Clean slate: cancel the Agent Runner (idempotent) and every
        // in-flight tool, and abandon unsent sentences. The audio queue
        // is left alone here — only a regenerate drains it, since a
        // resume needs those already-synthesized frames intact.
        if let Some(cancel) = self.agent_cancel.take() {
            cancel.cancel();
        }
        self.tool_registry.cancel_all();
        while self.text_rx.try_recv().is_ok() {}

        let transcripts = self.session.take_stt_outputs();
        let has_stt = !transcripts.is_empty();
        let is_interruption = self.session.interruption_status == InterruptionStatus::Active;
        let decision =
            self.prompt_generator.generate(&transcripts, &self.session.chat_history, is_interruption);

        let can_resume = !has_stt || !decision.needs_new_prompt;
        let ends_in_user = matches!(self.session.chat_history.last(), Some(m) if m.role == ChatRole::User);
        let is_false_alarm = has_stt && !decision.needs_new_prompt;

        if can_resume && self.session.playback_status == PlaybackStatus::Paused {
            TraceEvent::DecisionResolved {
                session_id: self.session.id.clone(),
                outcome: "resume".into(),
                is_false_alarm,
            }
            .emit();
            self.resume().await;
        } else if can_resume
            && self.session.playback_status != PlaybackStatus::Paused
            && ends_in_user
            && self.session.agent_status == StageStatus::Idle
        {
            TraceEvent::DecisionResolved {
                session_id: self.session.id.clone(),
                outcome: "reset_and_regenerate".into(),
                is_false_alarm,
            }
            .emit();
            self.send(ServerEvent::PlaybackReset).await;
            self.regenerate(decision.cleaned_history, decision.needs_new_prompt, decision.prompt).await;
        } else {
            TraceEvent::DecisionResolved {
                session_id: self.session.id.clone(),
                outcome: "regenerate".into(),
                is_false_alarm,
            }
            .emit();
            self.regenerate(decision.cleaned_history, decision.needs_new_prompt, decision.prompt).await;
        }
    }

    /// Branch A: false alarm, or a backchannel while nothing new needs
    /// saying — resume the paused playback in place.
    async fn resume(&mut self) {
        self.send(ServerEvent::PlaybackResume).await;
        self.session.playback_status = PlaybackStatus::Active;
        self.session.client_playback_active = true;
        self.session.client_was_active_before_interruption = false;
        self.session.interruption_status = InterruptionStatus::Idle;
    }

    /// Branch B/C: a real interruption, or a fresh turn — (re)generate
    /// from `cleaned_history`, installing a new prompt if one is needed.
    async fn regenerate(&mut self, cleaned_history: Vec<ChatMessage>, needs_new_prompt: bool, prompt: String) {
        self.session.playback_status = PlaybackStatus::Paused;
        while self.audio_rx.try_recv().is_ok() {}

        self.session.chat_history = cleaned_history;
        if needs_new_prompt && !matches!(self.session.chat_history.last(), Some(m) if m.role == ChatRole::User) {
            self.session.chat_history.push(ChatMessage::user(prompt));
        }

        self.session.interruption_status = InterruptionStatus::Idle;
        self.session.client_was_active_before_interruption = false;
        self.session.response_in_progress = false;
        self.session.playback_status = PlaybackStatus::Idle;
        self.session.agent_status = StageStatus::Processing;
        self.session.generation_id += 1;

        TraceEvent::TurnStarted {
            session_id: self.session.id.clone(),
            generation_id: self.session.generation_id,
        }
        .emit();
        crate::runtime::agent::spawn_agent_runner(self);
    }
}
