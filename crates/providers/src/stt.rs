//! OpenAI-compatible speech-to-text adapter (the STT Worker, C3, talks to
//! this through [`crate::traits::SttProvider`]).
//!
//! Wraps the raw PCM16 mono audio the gateway receives from the client in a
//! minimal WAV container, since the multipart transcription endpoint
//! expects a named audio file rather than a raw byte stream.

use crate::traits::SttProvider;
use crate::util::{from_reqwest, resolve_api_key, retry_transient};
use bargein_domain::config::SttConfig;
use bargein_domain::error::{Error, Result};
use serde_json::Value;

/// Sample rate assumed for incoming PCM16 audio (see [`SttConfig::min_audio_bytes`]).
const SAMPLE_RATE_HZ: u32 = 16_000;

pub struct OpenAiSttProvider {
    id: String,
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
    timeout: std::time::Duration,
    max_retries: u32,
}

impl OpenAiSttProvider {
    pub fn from_config(cfg: &SttConfig) -> Result<Self> {
        let api_key = resolve_api_key(&cfg.auth)?;
        let timeout = std::time::Duration::from_millis(cfg.timeout_ms);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            id: "stt".into(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: cfg.model.clone(),
            client,
            timeout,
            max_retries: cfg.max_retries,
        })
    }
}

/// Wrap raw little-endian PCM16 mono samples in a 44-byte canonical WAV header.
fn wrap_pcm16_wav(pcm: &[u8]) -> Vec<u8> {
    let data_len = pcm.len() as u32;
    let byte_rate = SAMPLE_RATE_HZ * 2;
    let mut wav = Vec::with_capacity(44 + pcm.len());

    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&SAMPLE_RATE_HZ.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes()); // block align
    wav.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(pcm);

    wav
}

#[async_trait::async_trait]
impl SttProvider for OpenAiSttProvider {
    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        let wav = wrap_pcm16_wav(audio);
        let url = format!("{}/audio/transcriptions", self.base_url);
        tracing::debug!(provider = %self.id, url = %url, "stt transcribe request");

        let resp_text = retry_transient(self.max_retries, || async {
            let part = reqwest::multipart::Part::bytes(wav.clone())
                .file_name("audio.wav")
                .mime_str("audio/wav")
                .map_err(from_reqwest)?;
            let form = reqwest::multipart::Form::new()
                .text("model", self.model.clone())
                .part("file", part);

            let send = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .multipart(form)
                .send();

            let resp = tokio::time::timeout(self.timeout, send)
                .await
                .map_err(|_| Error::Timeout(format!("stt request to {url} timed out")))?
                .map_err(from_reqwest)?;

            let status = resp.status();
            let body = resp.text().await.map_err(from_reqwest)?;
            if !status.is_success() {
                return Err(Error::Provider {
                    provider: self.id.clone(),
                    message: format!("HTTP {} - {}", status.as_u16(), body),
                });
            }
            Ok(body)
        })
        .await?;

        let body: Value = serde_json::from_str(&resp_text)?;
        body.get("text")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::Provider {
                provider: self.id.clone(),
                message: "missing 'text' field in transcription response".into(),
            })
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_pcm16_wav_header_is_44_bytes_plus_data() {
        let pcm = vec![0u8; 100];
        let wav = wrap_pcm16_wav(&pcm);
        assert_eq!(wav.len(), 144);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[36..40], b"data");
    }

    #[test]
    fn wrap_pcm16_wav_empty_input() {
        let wav = wrap_pcm16_wav(&[]);
        assert_eq!(wav.len(), 44);
    }
}
