use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session / orchestration tuning
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Debounce window for the Decision Task (§4.4) before it resolves
    /// a pause into resume / regenerate / resume-not-possible.
    #[serde(default = "d_debounce_ms")]
    pub debounce_ms: u64,
    /// Bound on the text stream queue (agent deltas → TTS Worker, §5).
    #[serde(default = "d_text_queue_bound")]
    pub text_queue_bound: usize,
    /// Bound on the audio output queue (TTS Worker → Playback Dispatcher, §5).
    #[serde(default = "d_audio_queue_bound")]
    pub audio_queue_bound: usize,
    /// Backchannel / false-alarm phrases recognized by the Prompt Generator
    /// (§4.7). Lowercased on load; callers may add/remove entries at runtime.
    #[serde(default = "d_backchannel_phrases")]
    pub backchannel_phrases: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: d_debounce_ms(),
            text_queue_bound: d_text_queue_bound(),
            audio_queue_bound: d_audio_queue_bound(),
            backchannel_phrases: d_backchannel_phrases(),
        }
    }
}

fn d_debounce_ms() -> u64 {
    100
}
fn d_text_queue_bound() -> usize {
    50
}
fn d_audio_queue_bound() -> usize {
    20
}
fn d_backchannel_phrases() -> Vec<String> {
    [
        "uh huh", "uh-huh", "mhmm", "mm-hmm", "okay", "ok", "yeah", "yep", "yes", "got it",
        "i see", "right", "sure", "alright", "continue", "go on", "go ahead",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
