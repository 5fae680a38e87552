//! The conversation orchestrator: per-connection coordination of STT, LLM,
//! TTS, and audio playback under barge-in interruption.

pub mod bootstrap;
pub mod cli;
pub mod runtime;
pub mod state;
pub mod ws;
