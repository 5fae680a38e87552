//! AppState construction extracted from `main.rs`, so the `serve` and
//! `config` CLI commands share the same boot path.

use std::sync::Arc;

use anyhow::Context;

use bargein_domain::config::{Config, ConfigSeverity};
use bargein_providers::{build_llm_provider, build_stt_provider, build_tts_provider};
use bargein_tools::{ActiveToolRegistry, BackgroundToolScheduler};

use crate::state::AppState;

/// Validate config and initialize the provider trio plus the shared tool
/// infrastructure. Sessions are ephemeral (§6 "Persisted state: None"), so
/// unlike a long-running service there is no session store or periodic
/// flush task to spawn alongside this.
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues
                .iter()
                .filter(|i| i.severity == ConfigSeverity::Error)
                .count()
        );
    }

    let llm = build_llm_provider(&config).context("initializing LLM provider")?;
    tracing::info!(provider = llm.provider_id(), "LLM provider ready");

    let stt = build_stt_provider(&config).context("initializing STT provider")?;
    tracing::info!(provider = stt.provider_id(), "STT provider ready");

    let tts = build_tts_provider(&config).context("initializing TTS provider")?;
    tracing::info!(provider = tts.provider_id(), "TTS provider ready");

    let tool_registry = Arc::new(ActiveToolRegistry::new());
    let tool_scheduler = BackgroundToolScheduler::new(tool_registry.clone());
    tracing::info!("tool registry + scheduler ready");

    Ok(AppState {
        config,
        llm,
        stt,
        tts,
        tool_registry,
        tool_scheduler,
    })
}
