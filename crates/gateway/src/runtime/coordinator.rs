//! The per-session coordinator (§5): a single-threaded cooperative owner
//! of one [`Session`], driving STT, the Decision Task, the Agent Runner,
//! TTS, and playback dispatch through one `tokio::select!` loop. Nothing
//! outside this module ever touches `Session` directly — every other
//! worker is a task this coordinator spawns and rejoins via a channel.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use bargein_domain::config::Config;
use bargein_domain::trace::TraceEvent;
use bargein_protocol::{ClientEvent, ServerEvent};
use bargein_providers::{LlmProvider, SttProvider, TtsProvider};
use bargein_session::queue::{is_stale, AudioOutputItem, TextStreamItem};
use bargein_session::{ChatMessage, InterruptionStatus, PlaybackStatus, PromptGenerator, Session, StageStatus};
use bargein_tools::ActiveToolRegistry;

use crate::runtime::tools::ToolTable;

/// Result of a completed Agent Runner generation (§4.5 step 5), delivered
/// back to the coordinator for the commit decision.
pub(crate) struct AgentDone {
    pub(crate) generation_id: u64,
    pub(crate) full_text: String,
}

/// Owns one [`Session`] exclusively and drives the whole pipeline.
pub struct Coordinator {
    pub(crate) session: Session,
    pub(crate) config: Arc<Config>,
    pub(crate) llm: Arc<dyn LlmProvider>,
    pub(crate) stt: Arc<dyn SttProvider>,
    pub(crate) tts: Arc<dyn TtsProvider>,
    pub(crate) tool_registry: Arc<ActiveToolRegistry>,
    pub(crate) tool_table: Arc<ToolTable>,
    pub(crate) prompt_generator: PromptGenerator,
    outbound: mpsc::Sender<ServerEvent>,

    // STT Worker (C3): one in-flight job at a time. `sttJobQueue` is
    // unbounded (§3) and only ever touched by this coordinator, so a plain
    // `VecDeque` plays that role instead of a channel.
    pub(crate) stt_queue: VecDeque<Vec<u8>>,
    stt_busy: bool,
    stt_done_tx: mpsc::Sender<String>,
    stt_done_rx: mpsc::Receiver<String>,

    // Decision Task (C4): the debounce is a cancellable background sleep;
    // only the most recently scheduled one ever fires (invariant 1).
    pub(crate) decision_cancel: Option<CancellationToken>,
    pub(crate) decision_tx: mpsc::Sender<()>,
    decision_rx: mpsc::Receiver<()>,

    // Agent Runner (C5): `text_tx`/`text_rx` together ARE `textStreamQueue`
    // (bound 50) — the runner's `send().await` blocking on a full channel
    // is exactly the backpressure §5 describes.
    pub(crate) agent_cancel: Option<CancellationToken>,
    pub(crate) text_tx: mpsc::Sender<TextStreamItem>,
    pub(crate) text_rx: mpsc::Receiver<TextStreamItem>,
    pub(crate) agent_done_tx: mpsc::Sender<AgentDone>,
    agent_done_rx: mpsc::Receiver<AgentDone>,
    // Fires once per generation, the moment the Agent Runner sees its
    // first token (§4.5 step 2: "On first token: agentStatus <- STREAMING").
    // Without this the Interruption Handler could never tell PROCESSING
    // from STREAMING and would always cancel (§4.2 step 9).
    pub(crate) agent_streaming_tx: mpsc::Sender<u64>,
    agent_streaming_rx: mpsc::Receiver<u64>,

    // TTS Worker (C6): `audio_tx`/`audio_rx` ARE `audioOutputQueue` (bound
    // 20).
    tts_busy: bool,
    pub(crate) audio_tx: mpsc::Sender<AudioOutputItem>,
    pub(crate) audio_rx: mpsc::Receiver<AudioOutputItem>,
    tts_done_tx: mpsc::Sender<()>,
    tts_done_rx: mpsc::Receiver<()>,
}

impl Coordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_id: String,
        config: Arc<Config>,
        llm: Arc<dyn LlmProvider>,
        stt: Arc<dyn SttProvider>,
        tts: Arc<dyn TtsProvider>,
        tool_registry: Arc<ActiveToolRegistry>,
        tool_table: Arc<ToolTable>,
        outbound: mpsc::Sender<ServerEvent>,
    ) -> Self {
        let prompt_generator = PromptGenerator::new(config.session.backchannel_phrases.clone());
        let (stt_done_tx, stt_done_rx) = mpsc::channel(8);
        let (decision_tx, decision_rx) = mpsc::channel(8);
        let (text_tx, text_rx) = mpsc::channel(config.session.text_queue_bound.max(1));
        let (agent_done_tx, agent_done_rx) = mpsc::channel(4);
        let (agent_streaming_tx, agent_streaming_rx) = mpsc::channel(4);
        let (audio_tx, audio_rx) = mpsc::channel(config.session.audio_queue_bound.max(1));
        let (tts_done_tx, tts_done_rx) = mpsc::channel(8);

        Self {
            session: Session::new(session_id),
            config,
            llm,
            stt,
            tts,
            tool_registry,
            tool_table,
            prompt_generator,
            outbound,
            stt_queue: VecDeque::new(),
            stt_busy: false,
            stt_done_tx,
            stt_done_rx,
            decision_cancel: None,
            decision_tx,
            decision_rx,
            agent_cancel: None,
            text_tx,
            text_rx,
            agent_done_tx,
            agent_done_rx,
            agent_streaming_tx,
            agent_streaming_rx,
            tts_busy: false,
            audio_tx,
            audio_rx,
            tts_done_tx,
            tts_done_rx,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session.id
    }

    pub(crate) async fn send(&self, event: ServerEvent) {
        if self.outbound.send(event).await.is_err() {
            tracing::debug!(session_id = %self.session.id, "outbound channel closed");
        }
    }

    pub(crate) fn agent_done_tx(&self) -> mpsc::Sender<AgentDone> {
        self.agent_done_tx.clone()
    }

    pub(crate) fn agent_streaming_tx(&self) -> mpsc::Sender<u64> {
        self.agent_streaming_tx.clone()
    }

    pub(crate) fn decision_tx(&self) -> mpsc::Sender<()> {
        self.decision_tx.clone()
    }

    /// Run until the inbound channel closes (client disconnected), then
    /// perform the lifecycle cleanup of §3 ("workers cancelled/drained
    /// exactly once").
    pub async fn run(mut self, mut inbound: mpsc::Receiver<ClientEvent>) {
        loop {
            tokio::select! {
                biased;

                maybe_event = inbound.recv() => {
                    match maybe_event {
                        Some(event) => self.dispatch_client_event(event).await,
                        None => break,
                    }
                }

                Some(transcript) = self.stt_done_rx.recv() => {
                    self.on_stt_result(transcript).await;
                }

                Some(()) = self.decision_rx.recv() => {
                    self.run_decision().await;
                }

                item = self.text_rx.recv(), if !self.tts_busy => {
                    if let Some(item) = item {
                        self.on_text_item(item).await;
                    }
                }

                Some(done) = self.agent_done_rx.recv() => {
                    self.on_agent_done(done);
                }

                Some(generation_id) = self.agent_streaming_rx.recv() => {
                    if !bargein_session::queue::is_stale(generation_id, self.session.generation_id) {
                        self.session.agent_status = StageStatus::Streaming;
                    }
                }

                // Drained whenever playback isn't paused: an Idle gate would
                // never let the dispatcher observe the first frame of a
                // fresh generation, so Idle has to drain too — the first
                // frame is what "wakes" it into Active (§4.4 Branch B step 4).
                frame = self.audio_rx.recv(), if self.session.playback_status != PlaybackStatus::Paused => {
                    if let Some(frame) = frame {
                        self.on_audio_item(frame).await;
                    }
                }

                Some(()) = self.tts_done_rx.recv() => {
                    self.tts_busy = false;
                    self.session.tts_status = StageStatus::Idle;
                }
            }
        }

        self.shutdown();
    }

    /// §3 Lifecycle: cancel every worker, the in-flight Agent Runner, and
    /// every registered tool exactly once on disconnect.
    fn shutdown(&mut self) {
        if let Some(cancel) = self.decision_cancel.take() {
            cancel.cancel();
        }
        if let Some(cancel) = self.agent_cancel.take() {
            cancel.cancel();
        }
        let cancelled = self.tool_registry.cancel_all();
        tracing::info!(
            session_id = %self.session.id,
            cancelled_tools = cancelled,
            "session disconnected, cleanup complete"
        );
    }

    // ── C2: Event Dispatcher (§4.1) ───────────────────────────────────

    async fn dispatch_client_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::SpeechStart => self.pause_reaction().await,
            ClientEvent::SpeechEnd { audio } => {
                use base64::Engine;
                match base64::engine::general_purpose::STANDARD.decode(audio) {
                    Ok(bytes) if !bytes.is_empty() => {
                        self.stt_queue.push_back(bytes);
                        self.maybe_dispatch_stt();
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(
                            session_id = %self.session.id,
                            error = %e,
                            "malformed speech_end audio, ignoring"
                        );
                    }
                }
            }
            ClientEvent::ClientPlaybackStarted => {
                self.session.client_playback_active = true;
            }
            ClientEvent::ClientPlaybackComplete => {
                self.session.client_playback_active = false;
                if self.session.agent_status == StageStatus::Idle {
                    self.session.response_in_progress = false;
                }
            }
        }
    }

    // ── C3: STT Worker dispatch (§4.3) ────────────────────────────────

    fn maybe_dispatch_stt(&mut self) {
        if self.stt_busy {
            return;
        }
        let Some(audio) = self.stt_queue.pop_front() else {
            return;
        };
        self.stt_busy = true;
        self.session.stt_status = StageStatus::Processing;

        let min_bytes = self.config.stt.as_ref().map(|c| c.min_audio_bytes).unwrap_or(0);
        crate::runtime::stt::spawn_stt_job(
            self.session.id.clone(),
            self.stt.clone(),
            min_bytes,
            audio,
            self.stt_done_tx.clone(),
        );
    }

    async fn on_stt_result(&mut self, transcript: String) {
        self.stt_busy = false;
        self.session.stt_status = StageStatus::Idle;

        if !transcript.trim().is_empty() {
            self.session.stt_output_list.push(transcript);
            self.schedule_decision();
        } else if self.session.interruption_status == InterruptionStatus::Active
            || self.session.client_was_active_before_interruption
            || self.session.playback_status == PlaybackStatus::Paused
            || self.session.response_in_progress
        {
            // §4.3: an empty transcript inside an interruption context is a
            // false alarm, not silence to ignore — it still has to resolve
            // through the Decision Task so playback can resume.
            self.schedule_decision();
        }

        self.maybe_dispatch_stt();
    }

    // ── C6/C7: text queue → TTS dispatch, audio queue → client dispatch ──

    async fn on_text_item(&mut self, item: TextStreamItem) {
        if is_stale(item.generation_id(), self.session.generation_id) {
            return;
        }
        match item {
            TextStreamItem::Sentence { generation_id, text } => {
                self.tts_busy = true;
                self.session.tts_status = StageStatus::Processing;
                crate::runtime::tts::spawn_tts_job(
                    self.session.id.clone(),
                    self.tts.clone(),
                    self.audio_tx.clone(),
                    self.tts_done_tx.clone(),
                    generation_id,
                    text,
                );
            }
            TextStreamItem::EndOfStream { generation_id } => {
                let _ = self.audio_tx.send(AudioOutputItem::EndOfStream { generation_id }).await;
            }
        }
    }

    async fn on_audio_item(&mut self, item: AudioOutputItem) {
        if is_stale(item.generation_id(), self.session.generation_id) {
            return;
        }
        if let AudioOutputItem::Frame { audio_base64, .. } = item {
            if self.session.playback_status == PlaybackStatus::Idle {
                self.session.playback_status = PlaybackStatus::Active;
            }
            self.send(ServerEvent::PlayAudio { audio: audio_base64 }).await;
        }
    }

    fn on_agent_done(&mut self, done: AgentDone) {
        if is_stale(done.generation_id, self.session.generation_id) {
            // A superseded generation's commit is dropped (§4.5 step 5).
            TraceEvent::TurnDiscarded {
                session_id: self.session.id.clone(),
                generation_id: done.generation_id,
                current_generation_id: self.session.generation_id,
            }
            .emit();
            return;
        }
        self.session.push_history(ChatMessage::agent(done.full_text));
        self.session.agent_status = StageStatus::Idle;
    }
}
