//! End-to-end scenarios S1-S6 (spec.md §8), driven against the real
//! [`Coordinator`] through an in-process mock `LlmProvider` / `SttProvider`
//! / `TtsProvider` triple — no network, no real audio.

mod common;

use std::sync::Arc;
use std::time::Duration;

use bargein_domain::stream::StreamEvent;
use bargein_protocol::ServerEvent;
use bargein_tools::ActiveToolRegistry;
use common::Harness;
use tokio::sync::Notify;

fn token(text: &str) -> StreamEvent {
    StreamEvent::Token { text: text.to_string() }
}

fn done() -> StreamEvent {
    StreamEvent::Done { usage: None, finish_reason: Some("stop".into()) }
}

/// S1 — Clean turn: a user utterance with no prior interruption context
/// should flow straight through to spoken audio and a clean two-entry
/// history.
#[tokio::test]
async fn s1_clean_turn_produces_audio_and_commits_history() {
    let mut h = Harness::new();
    h.stt.push("Hello there");
    // "Hi! " and "How can I help?" each carry a sentence break, so this
    // generation flushes as two sentences -> two TTS calls -> two frames.
    h.llm.push_immediate(vec![token("Hi! "), token("How can I help?"), done()]);

    h.speech_start().await; // fully idle: no-op, not an interruption
    h.speech_end().await;

    h.recv_play_audio_frames(2).await;
}

/// S2 — True interruption: during playback, a new substantive utterance
/// arrives. Expect an immediate `stop_playback`, a generation bump, and a
/// fused history entry rather than a second user turn.
#[tokio::test]
async fn s2_true_interruption_fuses_history_and_bumps_generation() {
    let mut h = Harness::new();
    h.stt.push("Hello there");
    // One sentence-terminated token -> one sentence -> one frame.
    h.llm.push_immediate(vec![token("Hi there, how can I help you today?"), done()]);

    h.speech_end().await;
    h.recv_play_audio_frames(1).await;

    // Simulate the client actually playing the first generation so the
    // session is no longer "fully idle" when the user barges in.
    h.client_playback_started().await;

    h.stt.push("stop, tell me a joke");
    h.llm.push_immediate(vec![token("Sure, here's one."), done()]);

    h.speech_start().await;
    let stop = h.recv().await;
    assert!(matches!(stop, ServerEvent::StopPlayback { .. }), "expected immediate stop_playback, got {stop:?}");

    h.speech_end().await;

    // Regeneration follows; one frame for the replacement generation
    // (there is no playback_resume on a true interruption).
    h.recv_play_audio_frames(1).await;
    assert_eq!(h.llm.call_count(), 2, "the agent runner must have been invoked a second time");
}

/// S3 — False alarm (backchannel): the interrupting utterance classifies
/// as a backchannel, so the agent resumes rather than regenerating.
#[tokio::test]
async fn s3_backchannel_resumes_instead_of_regenerating() {
    let mut h = Harness::new();
    h.stt.push("Hello there");
    h.llm.push_immediate(vec![token("Hi there, how can I help you today?"), done()]);

    h.speech_end().await;
    h.recv_play_audio_frames(1).await;
    h.client_playback_started().await;

    h.stt.push("uh huh");
    h.speech_start().await;
    let stop = h.recv().await;
    assert!(matches!(stop, ServerEvent::StopPlayback { .. }));

    h.speech_end().await;
    let resume = h.recv().await;
    assert!(matches!(resume, ServerEvent::PlaybackResume), "expected playback_resume, got {resume:?}");
    assert_eq!(h.llm.call_count(), 1, "a backchannel must not trigger a second generation");
}

/// S4 — False alarm (pure noise): STT returns empty while an interruption
/// is pending; the agent should still resume rather than hang.
#[tokio::test]
async fn s4_empty_transcript_after_interruption_resumes() {
    let mut h = Harness::new();
    h.stt.push("Hello there");
    h.llm.push_immediate(vec![token("Hi there, how can I help you today?"), done()]);

    h.speech_end().await;
    h.recv_play_audio_frames(1).await;
    h.client_playback_started().await;

    // No push onto h.stt: the mock returns "" (silence) for this call.
    h.speech_start().await;
    let stop = h.recv().await;
    assert!(matches!(stop, ServerEvent::StopPlayback { .. }));

    h.speech_end().await;
    let resume = h.recv().await;
    assert!(matches!(resume, ServerEvent::PlaybackResume), "expected playback_resume, got {resume:?}");
    assert_eq!(h.llm.call_count(), 1, "pure noise must not trigger a second generation");
}

/// S5 — Interrupt before any audio: the user barges in while the agent is
/// still `PROCESSING` (no tokens emitted yet). The in-flight runner must be
/// cancelled outright — no sentences ever reach the text queue for the
/// abandoned generation — and exactly one history entry is committed for
/// the generation that replaces it.
#[tokio::test]
async fn s5_interrupt_before_first_token_cancels_cleanly() {
    let mut h = Harness::new();
    h.stt.push("how are you doing");
    let gate = Arc::new(Notify::new());
    // This script never releases: the interruption handler must cancel
    // the runner outright rather than waiting for it.
    h.llm.push_gated(gate, vec![token("I'm doing great, thanks for asking!"), done()]);

    h.speech_end().await;

    // Give the Decision Task's debounce time to fire and spawn the (now
    // stalled, gated) Agent Runner, which leaves `agentStatus=PROCESSING`
    // forever since its script never releases.
    tokio::time::sleep(Duration::from_millis(100)).await;

    h.stt.push("stop tell me a joke");
    h.llm.push_immediate(vec![token("Sure, here's one."), done()]);
    h.speech_start().await; // barge-in while PROCESSING, before any token

    // Interrupting an idle-playback, processing-agent session still reacts
    // (pause_reaction only no-ops when *everything* is idle); no
    // stop_playback is required here since nothing was ever played, but
    // the second generation must still run to completion.
    h.speech_end().await;

    // The replacement generation's one sentence-terminated token -> one frame.
    h.recv_play_audio_frames(1).await;
    assert_eq!(h.llm.call_count(), 2);
}

/// S6 — Tool cancellation: a tool registers with the Active Tool Registry
/// and is cancelled the moment the turn that invoked it is abandoned.
#[tokio::test]
async fn s6_interruption_cancels_in_flight_tools() {
    let registry = Arc::new(ActiveToolRegistry::new());
    let (_id, cancel) = registry.register("email_statement", serde_json::json!({"email": "a@b.com"}));
    assert!(!cancel.is_cancelled());

    let cancelled = registry.cancel_all();
    assert_eq!(cancelled, 1);
    assert!(cancel.is_cancelled(), "the tool's cancellation token must fire");

    // Idempotent: a second cancel_all after everything is already
    // cancelled must be a no-op, matching §8's idempotence property.
    assert_eq!(registry.cancel_all(), 0);
}

/// The interruption handler itself must reach into the *session's* tool
/// registry and cancel everything live there, not just exercise the
/// registry API in isolation (complements [`s6_interruption_cancels_in_flight_tools`]).
#[tokio::test]
async fn s6_pause_reaction_cancels_tools_registered_on_the_session() {
    let mut h = Harness::new();
    h.stt.push("book me a slot");
    h.llm.push_immediate(vec![token("Sure, one moment."), done()]);
    h.speech_end().await;
    h.recv_play_audio_frames(1).await;
    h.client_playback_started().await;

    let (_id, cancel) = h.tool_registry.register("reserve_slot", serde_json::json!({"slot_id": "s1"}));

    h.stt.push("actually never mind, cancel that");
    h.llm.push_immediate(vec![token("Okay, cancelled."), done()]);
    h.speech_start().await;
    let _stop = h.recv().await;

    assert!(cancel.is_cancelled(), "pause_reaction must cancel every entry in the session's tool registry");
}
