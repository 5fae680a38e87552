use super::auth::AuthConfig;
use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// STT provider (C3, STT Worker)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttConfig {
    pub base_url: String,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default = "d_model")]
    pub model: String,
    #[serde(default = "d_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "d_max_retries")]
    pub max_retries: u32,
    /// Audio buffers shorter than this are treated as silence and skipped
    /// without calling the provider. PCM16/16kHz-specific; see the
    /// open question on expressing this as a duration instead of bytes.
    #[serde(default = "d_min_audio_bytes")]
    pub min_audio_bytes: usize,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            auth: AuthConfig::default(),
            model: d_model(),
            timeout_ms: d_timeout_ms(),
            max_retries: d_max_retries(),
            min_audio_bytes: d_min_audio_bytes(),
        }
    }
}

fn d_model() -> String {
    "whisper-1".into()
}
fn d_timeout_ms() -> u64 {
    10_000
}
fn d_max_retries() -> u32 {
    1
}
fn d_min_audio_bytes() -> usize {
    5000
}
