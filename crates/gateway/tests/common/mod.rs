//! In-process mock `LlmProvider` / `SttProvider` / `TtsProvider` triple for
//! driving the orchestrator end to end without any network access, per
//! SPEC_FULL.md §10.5 / spec.md §8's scenarios S1-S6.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, Notify};

use bargein_domain::capability::LlmCapabilities;
use bargein_domain::config::{Config, LlmConfig, SessionConfig, SttConfig, TtsConfig};
use bargein_domain::error::{Error, Result};
use bargein_domain::stream::{BoxStream, StreamEvent};
use bargein_protocol::{ClientEvent, ServerEvent};
use bargein_providers::{ChatRequest, ChatResponse, LlmProvider, SttProvider, TtsProvider};
use bargein_tools::{ActiveToolRegistry, BackgroundToolScheduler};

/// One scripted response for [`MockLlmProvider::chat_stream`].
pub enum Script {
    /// Emit every event immediately, back to back.
    Immediate(Vec<StreamEvent>),
    /// Wait for `gate` to be notified before emitting anything — used to
    /// hold a generation in `agentStatus = PROCESSING` so a test can
    /// interrupt it before the first token (S5).
    Gated(Arc<Notify>, Vec<StreamEvent>),
}

/// A scripted [`LlmProvider`]: each call to `chat_stream` consumes the next
/// queued [`Script`], falling back to an immediate empty completion once
/// the queue is drained.
pub struct MockLlmProvider {
    scripts: Mutex<VecDeque<Script>>,
    capabilities: LlmCapabilities,
    calls: AtomicUsize,
}

impl MockLlmProvider {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(VecDeque::new()),
            capabilities: LlmCapabilities::default(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn push_immediate(&self, events: Vec<StreamEvent>) {
        self.scripts.lock().unwrap().push_back(Script::Immediate(events));
    }

    pub fn push_gated(&self, gate: Arc<Notify>, events: Vec<StreamEvent>) {
        self.scripts.lock().unwrap().push_back(Script::Gated(gate, events));
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn done_event() -> StreamEvent {
    StreamEvent::Done { usage: None, finish_reason: Some("stop".into()) }
}

#[async_trait::async_trait]
impl LlmProvider for MockLlmProvider {
    async fn chat(&self, _req: &ChatRequest) -> Result<ChatResponse> {
        Err(Error::Other("MockLlmProvider only supports chat_stream".into()))
    }

    async fn chat_stream(&self, _req: &ChatRequest) -> Result<BoxStream<'static, Result<StreamEvent>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Script::Immediate(vec![done_event()]));

        match script {
            Script::Immediate(events) => {
                Ok(Box::pin(futures_util::stream::iter(events.into_iter().map(Ok))))
            }
            Script::Gated(gate, events) => Ok(Box::pin(async_stream::stream! {
                gate.notified().await;
                for ev in events {
                    yield Ok(ev);
                }
            })),
        }
    }

    fn capabilities(&self) -> &LlmCapabilities {
        &self.capabilities
    }

    fn provider_id(&self) -> &str {
        "mock-llm"
    }
}

/// A scripted [`SttProvider`]: each call pops the next queued transcript,
/// returning an empty string once the queue is drained (silence).
pub struct MockSttProvider {
    transcripts: Mutex<VecDeque<String>>,
}

impl MockSttProvider {
    pub fn new() -> Self {
        Self { transcripts: Mutex::new(VecDeque::new()) }
    }

    pub fn push(&self, transcript: impl Into<String>) {
        self.transcripts.lock().unwrap().push_back(transcript.into());
    }
}

#[async_trait::async_trait]
impl SttProvider for MockSttProvider {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String> {
        Ok(self.transcripts.lock().unwrap().pop_front().unwrap_or_default())
    }

    fn provider_id(&self) -> &str {
        "mock-stt"
    }
}

/// A [`TtsProvider`] that always "synthesizes" a fixed, non-empty payload
/// immediately — what matters to the orchestrator is that a frame shows
/// up on `audioOutputQueue`, not its bytes.
pub struct MockTtsProvider;

#[async_trait::async_trait]
impl TtsProvider for MockTtsProvider {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
        Ok(vec![0xAA, 0xBB, 0xCC])
    }

    fn provider_id(&self) -> &str {
        "mock-tts"
    }
}

/// A short-debounce, near-zero-threshold [`Config`] suited to tests: real
/// deployments use 100ms/5000 bytes, but waiting 100ms per assertion would
/// make the suite slow without adding any coverage.
pub fn test_config() -> Config {
    Config {
        session: SessionConfig { debounce_ms: 20, ..SessionConfig::default() },
        llm: Some(LlmConfig { tools_enabled: false, ..LlmConfig::default() }),
        stt: Some(SttConfig { min_audio_bytes: 0, ..SttConfig::default() }),
        tts: Some(TtsConfig::default()),
        ..Config::default()
    }
}

/// Everything a scenario test needs: the running coordinator's inbound
/// sender, its outbound receiver, and handles to the mocks so the test can
/// script STT/LLM responses as the scenario unfolds.
pub struct Harness {
    pub inbound: mpsc::Sender<ClientEvent>,
    pub outbound: mpsc::Receiver<ServerEvent>,
    pub stt: Arc<MockSttProvider>,
    pub llm: Arc<MockLlmProvider>,
    pub tool_registry: Arc<ActiveToolRegistry>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let config = Arc::new(config);
        let stt = Arc::new(MockSttProvider::new());
        let llm = Arc::new(MockLlmProvider::new());
        let tts = Arc::new(MockTtsProvider);
        let tool_registry = Arc::new(ActiveToolRegistry::new());
        let scheduler = BackgroundToolScheduler::new(tool_registry.clone());
        let tool_table = Arc::new(bargein_gateway::runtime::tools::ToolTable::new(scheduler));

        let (outbound_tx, outbound_rx) = mpsc::channel(64);
        let coordinator = bargein_gateway::runtime::Coordinator::new(
            "test-session".into(),
            config,
            llm.clone(),
            stt.clone(),
            tts,
            tool_registry.clone(),
            tool_table,
            outbound_tx,
        );

        let (inbound_tx, inbound_rx) = mpsc::channel(64);
        tokio::spawn(coordinator.run(inbound_rx));

        Self { inbound: inbound_tx, outbound: outbound_rx, stt, llm, tool_registry }
    }

    pub async fn speech_start(&self) {
        self.inbound.send(ClientEvent::SpeechStart).await.unwrap();
    }

    /// `speech_end` with a non-empty audio payload; `min_audio_bytes` is 0
    /// in [`test_config`], so any non-empty buffer reaches the mock STT.
    pub async fn speech_end(&self) {
        use base64::Engine;
        let audio = base64::engine::general_purpose::STANDARD.encode(b"fake-pcm16");
        self.inbound.send(ClientEvent::SpeechEnd { audio }).await.unwrap();
    }

    pub async fn client_playback_started(&self) {
        self.inbound.send(ClientEvent::ClientPlaybackStarted).await.unwrap();
    }

    pub async fn client_playback_complete(&self) {
        self.inbound.send(ClientEvent::ClientPlaybackComplete).await.unwrap();
    }

    /// Wait for the next server event, failing the test after a generous
    /// timeout rather than hanging forever if the orchestrator wedges.
    pub async fn recv(&mut self) -> ServerEvent {
        tokio::time::timeout(Duration::from_secs(2), self.outbound.recv())
            .await
            .expect("timed out waiting for a server event")
            .expect("outbound channel closed unexpectedly")
    }

    /// Receive exactly `n` `play_audio` events in a row, panicking on the
    /// first event that isn't one. The coordinator never sends an explicit
    /// end-of-generation sentinel to the client (§6), so a scenario has to
    /// know its expected frame count up front from the mock LLM script's
    /// sentence-break tokenization rather than "read until something else
    /// shows up" — otherwise a clean turn with nothing queued after it
    /// would hang until the `recv` timeout.
    pub async fn recv_play_audio_frames(&mut self, n: usize) {
        for i in 0..n {
            let event = self.recv().await;
            assert!(
                matches!(event, ServerEvent::PlayAudio { .. }),
                "expected play_audio frame {}/{n}, got {event:?}",
                i + 1,
            );
        }
    }
}
