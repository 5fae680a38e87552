use super::auth::AuthConfig;
use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LLM provider (single configured provider — the agent runner, C5)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub kind: ProviderKind,
    pub base_url: String,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default = "d_model")]
    pub model: String,
    #[serde(default = "d_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default = "d_true")]
    pub tools_enabled: bool,
    #[serde(default = "d_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "d_max_retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::OpenaiCompat,
            base_url: "https://api.openai.com/v1".into(),
            auth: AuthConfig::default(),
            model: d_model(),
            temperature: d_temperature(),
            system_prompt: None,
            tools_enabled: true,
            timeout_ms: d_timeout_ms(),
            max_retries: d_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    OpenaiCompat,
    Anthropic,
}

fn d_model() -> String {
    "gpt-4o-mini".into()
}
fn d_temperature() -> f32 {
    0.7
}
fn d_true() -> bool {
    true
}
fn d_timeout_ms() -> u64 {
    20_000
}
fn d_max_retries() -> u32 {
    2
}
