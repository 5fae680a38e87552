use serde::{Deserialize, Serialize};

/// Credentials for an external STT/LLM/TTS endpoint.
///
/// Resolution order (see `bargein_providers::util::resolve_api_key`):
/// 1. `key` — plaintext, discouraged, logged as a warning when used.
/// 2. `env` — read an environment variable at startup.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Env var containing the API key. Preferred over `key`.
    #[serde(default)]
    pub env: Option<String>,
    /// Direct key (config-only setups; prefer `env`).
    #[serde(default)]
    pub key: Option<String>,
    /// Header name used to carry the key. Defaults to `Authorization`.
    #[serde(default)]
    pub header: Option<String>,
    /// Header value prefix (e.g. `"Bearer "`).
    #[serde(default)]
    pub prefix: Option<String>,
}
