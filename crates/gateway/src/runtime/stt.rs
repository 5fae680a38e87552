//! STT Worker (§4.3, component C3).
//!
//! One audio buffer in flight at a time; the coordinator pops the next
//! buffer off `stt_queue` only once this one reports back.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::Instrument;

use bargein_domain::trace::TraceEvent;
use bargein_providers::SttProvider;

/// Transcribe one buffer, applying the minimum-size suppression at this
/// boundary rather than inside the provider adapter (§4.3: buffers under
/// `min_audio_bytes` are treated as silence and return an empty
/// transcript, not an error).
pub(crate) fn spawn_stt_job(
    session_id: String,
    stt: Arc<dyn SttProvider>,
    min_audio_bytes: usize,
    audio: Vec<u8>,
    done_tx: mpsc::Sender<String>,
) {
    let span = tracing::info_span!("stt.call", session_id = %session_id, "otel.kind" = "CLIENT");
    tokio::spawn(
        async move {
            let transcript = if audio.len() < min_audio_bytes {
                String::new()
            } else {
                let started = Instant::now();
                let (status, transcript) = match stt.transcribe(&audio).await {
                    Ok(text) => ("ok", text),
                    Err(e) => {
                        tracing::warn!(error = %e, "stt call failed, treating as no speech detected");
                        ("error", String::new())
                    }
                };
                TraceEvent::ProviderCall {
                    session_id: session_id.clone(),
                    provider: stt.provider_id().to_string(),
                    duration_ms: started.elapsed().as_millis() as u64,
                    status: status.to_string(),
                }
                .emit();
                transcript
            };
            let _ = done_tx.send(transcript).await;
        }
        .instrument(span),
    );
}
