use super::auth::AuthConfig;
use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TTS provider (C6, TTS Worker)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    pub base_url: String,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default = "d_model")]
    pub model: String,
    #[serde(default = "d_voice")]
    pub voice: String,
    #[serde(default = "d_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "d_max_retries")]
    pub max_retries: u32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            auth: AuthConfig::default(),
            model: d_model(),
            voice: d_voice(),
            timeout_ms: d_timeout_ms(),
            max_retries: d_max_retries(),
        }
    }
}

fn d_model() -> String {
    "tts-1".into()
}
fn d_voice() -> String {
    "alloy".into()
}
fn d_timeout_ms() -> u64 {
    10_000
}
fn d_max_retries() -> u32 {
    1
}
