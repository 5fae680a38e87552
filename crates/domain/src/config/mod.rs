mod auth;
mod llm;
mod server;
mod session;
mod stt;
mod tts;

pub use auth::*;
pub use llm::*;
pub use server::*;
pub use session::*;
pub use stt::*;
pub use tts::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub llm: Option<LlmConfig>,
    #[serde(default)]
    pub stt: Option<SttConfig>,
    #[serde(default)]
    pub tts: Option<TtsConfig>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good. Errors should stop
    /// startup (see `bargein-gateway`'s `config validate` / `serve`
    /// subcommands); warnings are surfaced but non-fatal.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "server.port".into(),
                message: "port must be greater than 0".into(),
            });
        }
        if self.server.host.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "server.host".into(),
                message: "host must not be empty".into(),
            });
        }
        if self.session.debounce_ms == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "session.debounce_ms".into(),
                message: "debounce must be greater than 0".into(),
            });
        }
        if self.session.text_queue_bound == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "session.text_queue_bound".into(),
                message: "text queue bound must be greater than 0".into(),
            });
        }
        if self.session.audio_queue_bound == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "session.audio_queue_bound".into(),
                message: "audio queue bound must be greater than 0".into(),
            });
        }

        if self.llm.is_none() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "llm".into(),
                message: "no LLM provider configured; sessions will fail at the agent runner"
                    .into(),
            });
        }
        if self.stt.is_none() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "stt".into(),
                message: "no STT provider configured; sessions will fail at the STT worker"
                    .into(),
            });
        }
        if self.tts.is_none() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "tts".into(),
                message: "no TTS provider configured; agent replies will not be spoken".into(),
            });
        }

        errors
    }

    /// True if any validation issue is an error (not just a warning).
    pub fn has_fatal_errors(&self) -> bool {
        self.validate()
            .iter()
            .any(|e| e.severity == ConfigSeverity::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_warns_on_missing_providers_but_has_no_errors() {
        let cfg = Config::default();
        let errors = cfg.validate();
        assert!(!cfg.has_fatal_errors());
        assert!(errors
            .iter()
            .any(|e| e.severity == ConfigSeverity::Warning && e.field == "llm"));
    }

    #[test]
    fn zero_port_is_fatal() {
        let mut cfg = Config::default();
        cfg.server.port = 0;
        assert!(cfg.has_fatal_errors());
    }

    #[test]
    fn zero_debounce_is_fatal() {
        let mut cfg = Config::default();
        cfg.session.debounce_ms = 0;
        assert!(cfg.has_fatal_errors());
    }
}
