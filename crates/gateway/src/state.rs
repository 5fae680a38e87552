use std::sync::Arc;

use bargein_domain::config::Config;
use bargein_providers::{LlmProvider, SttProvider, TtsProvider};
use bargein_tools::{ActiveToolRegistry, BackgroundToolScheduler};

/// Process-wide state shared by every session's coordinator.
///
/// Everything here is either immutable after boot (`config`, the provider
/// trio) or internally synchronized (the tool registry/scheduler, per
/// §5's "two cross-session shared resources"). Session-specific mutable
/// state never lives here — it lives in the `Session` record owned
/// exclusively by that session's coordinator task.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub llm: Arc<dyn LlmProvider>,
    pub stt: Arc<dyn SttProvider>,
    pub tts: Arc<dyn TtsProvider>,
    pub tool_registry: Arc<ActiveToolRegistry>,
    pub tool_scheduler: BackgroundToolScheduler,
}
