//! Concrete provider adapters for the LLM, STT, and TTS backends the
//! gateway talks to. Callers program against [`traits::LlmProvider`],
//! [`traits::SttProvider`], and [`traits::TtsProvider`] — never the
//! concrete structs — so the Agent Runner, STT Worker, and TTS Worker
//! don't care which vendor is behind the configured endpoint.

pub mod anthropic;
pub mod openai_compat;
pub mod stt;
pub mod traits;
pub mod tts;
pub(crate) mod sse;
pub(crate) mod util;

use bargein_domain::config::{Config, ProviderKind};
use bargein_domain::error::{Error, Result};
use std::sync::Arc;

pub use traits::{ChatRequest, ChatResponse, LlmProvider, SttProvider, TtsProvider};

/// Build the single configured [`LlmProvider`] from [`Config::llm`].
pub fn build_llm_provider(config: &Config) -> Result<Arc<dyn LlmProvider>> {
    let llm = config
        .llm
        .as_ref()
        .ok_or_else(|| Error::Config("no [llm] section configured".into()))?;
    match llm.kind {
        ProviderKind::OpenaiCompat => Ok(Arc::new(openai_compat::OpenAiCompatProvider::from_config(
            llm,
        )?)),
        ProviderKind::Anthropic => Ok(Arc::new(anthropic::AnthropicProvider::from_config(llm)?)),
    }
}

/// Build the single configured [`SttProvider`] from [`Config::stt`].
pub fn build_stt_provider(config: &Config) -> Result<Arc<dyn SttProvider>> {
    let cfg = config
        .stt
        .as_ref()
        .ok_or_else(|| Error::Config("no [stt] section configured".into()))?;
    Ok(Arc::new(stt::OpenAiSttProvider::from_config(cfg)?))
}

/// Build the single configured [`TtsProvider`] from [`Config::tts`].
pub fn build_tts_provider(config: &Config) -> Result<Arc<dyn TtsProvider>> {
    let cfg = config
        .tts
        .as_ref()
        .ok_or_else(|| Error::Config("no [tts] section configured".into()))?;
    Ok(Arc::new(tts::OpenAiTtsProvider::from_config(cfg)?))
}
