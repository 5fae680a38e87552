//! TTS Worker (§4.6, component C6).
//!
//! One sentence in flight at a time, synthesized on its own task so the
//! coordinator's select loop never blocks on the network call.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::Instrument;

use bargein_domain::trace::TraceEvent;
use bargein_providers::TtsProvider;
use bargein_session::queue::AudioOutputItem;

#[allow(clippy::too_many_arguments)]
pub(crate) fn spawn_tts_job(
    session_id: String,
    tts: Arc<dyn TtsProvider>,
    audio_tx: mpsc::Sender<AudioOutputItem>,
    done_tx: mpsc::Sender<()>,
    generation_id: u64,
    text: String,
) {
    let span = tracing::info_span!(
        "tts.call",
        session_id = %session_id,
        generation_id = %generation_id,
        "otel.kind" = "CLIENT",
    );
    tokio::spawn(
        async move {
            let started = Instant::now();
            let outcome = tts.synthesize(&text).await;
            TraceEvent::ProviderCall {
                session_id,
                provider: tts.provider_id().to_string(),
                duration_ms: started.elapsed().as_millis() as u64,
                status: if outcome.is_ok() { "ok" } else { "error" }.to_string(),
            }
            .emit();
            match outcome {
                Ok(bytes) => {
                    use base64::Engine;
                    let audio_base64 = base64::engine::general_purpose::STANDARD.encode(bytes);
                    // Backpressure: this await blocks while `audioOutputQueue`
                    // (bound 20) is full (§5).
                    let _ =
                        audio_tx.send(AudioOutputItem::Frame { generation_id, audio_base64 }).await;
                }
                Err(e) => {
                    // Per-sentence synthesis failures are logged and skipped;
                    // they do not abort the stream (§7).
                    tracing::warn!(error = %e, "tts synthesis failed, skipping sentence");
                }
            }
            let _ = done_tx.send(()).await;
        }
        .instrument(span),
    );
}
