//! OpenAI-compatible text-to-speech adapter (the TTS Worker, C6, talks to
//! this through [`crate::traits::TtsProvider`]).

use crate::traits::TtsProvider;
use crate::util::{from_reqwest, resolve_api_key, retry_transient};
use bargein_domain::config::TtsConfig;
use bargein_domain::error::{Error, Result};

pub struct OpenAiTtsProvider {
    id: String,
    base_url: String,
    api_key: String,
    model: String,
    voice: String,
    client: reqwest::Client,
    timeout: std::time::Duration,
    max_retries: u32,
}

impl OpenAiTtsProvider {
    pub fn from_config(cfg: &TtsConfig) -> Result<Self> {
        let api_key = resolve_api_key(&cfg.auth)?;
        let timeout = std::time::Duration::from_millis(cfg.timeout_ms);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            id: "tts".into(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: cfg.model.clone(),
            voice: cfg.voice.clone(),
            client,
            timeout,
            max_retries: cfg.max_retries,
        })
    }
}

#[async_trait::async_trait]
impl TtsProvider for OpenAiTtsProvider {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let url = format!("{}/audio/speech", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "voice": self.voice,
            "input": text,
            "response_format": "mp3",
        });

        tracing::debug!(provider = %self.id, url = %url, "tts synthesize request");

        retry_transient(self.max_retries, || async {
            let send = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send();

            let resp = tokio::time::timeout(self.timeout, send)
                .await
                .map_err(|_| Error::Timeout(format!("tts request to {url} timed out")))?
                .map_err(from_reqwest)?;

            let status = resp.status();
            if !status.is_success() {
                let err_text = resp.text().await.map_err(from_reqwest)?;
                return Err(Error::Provider {
                    provider: self.id.clone(),
                    message: format!("HTTP {} - {}", status.as_u16(), err_text),
                });
            }

            let bytes = resp.bytes().await.map_err(from_reqwest)?;
            Ok(bytes.to_vec())
        })
        .await
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}
