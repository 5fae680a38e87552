use bargein_domain::capability::LlmCapabilities;
use bargein_domain::error::Result;
use bargein_domain::stream::Usage;
use bargein_domain::stream::{BoxStream, StreamEvent};
use bargein_domain::tool::{Message, ToolCall, ToolDefinition};
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / Response types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A provider-agnostic chat completion request.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// The conversation messages to send.
    pub messages: Vec<Message>,
    /// Tool definitions the model may invoke.
    pub tools: Vec<ToolDefinition>,
    /// Sampling temperature (0.0 – 2.0). `None` lets the provider choose.
    pub temperature: Option<f32>,
    /// Maximum tokens in the response. `None` lets the provider choose.
    pub max_tokens: Option<u32>,
    /// Model identifier override. When `None`, the provider uses its default.
    pub model: Option<String>,
}

/// A provider-agnostic chat completion response.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Textual content of the response.
    pub content: String,
    /// Tool calls emitted by the model.
    pub tool_calls: Vec<ToolCall>,
    /// Token usage information.
    pub usage: Option<Usage>,
    /// The model that actually produced the response.
    pub model: String,
    /// The reason the model stopped generating (e.g. "stop", "tool_calls").
    pub finish_reason: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core provider traits
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Trait that every LLM adapter must implement — the Agent Runner (C5)
/// talks to this, never to a concrete provider struct.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request and wait for the full response.
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse>;

    /// Send a chat completion request and return a stream of events.
    async fn chat_stream(
        &self,
        req: &ChatRequest,
    ) -> Result<BoxStream<'static, Result<StreamEvent>>>;

    /// The advertised capabilities of this provider/model combination.
    fn capabilities(&self) -> &LlmCapabilities;

    /// A unique identifier for this provider instance.
    fn provider_id(&self) -> &str;
}

/// Trait the STT Worker (C3) talks to. One call per flushed audio chunk;
/// there is no partial/streaming transcription contract because the
/// upstream speech-to-text APIs this targets only expose request/response
/// transcription.
#[async_trait::async_trait]
pub trait SttProvider: Send + Sync {
    /// Transcribe one chunk of audio, given as raw PCM16 bytes.
    async fn transcribe(&self, audio: &[u8]) -> Result<String>;

    fn provider_id(&self) -> &str;
}

/// Trait the TTS Worker (C6) talks to.
#[async_trait::async_trait]
pub trait TtsProvider: Send + Sync {
    /// Synthesize one sentence of text into audio bytes (provider-native
    /// encoding; the Playback Dispatcher forwards them to the client as
    /// opaque base64 payloads).
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;

    fn provider_id(&self) -> &str;
}
