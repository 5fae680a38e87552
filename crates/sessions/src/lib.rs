//! Session data model for the conversation orchestrator.
//!
//! Everything here is pure data and pure functions — no I/O, no task
//! spawning. `bargein-gateway::runtime` owns the coordinator task that
//! mutates a [`Session`] and drives the Prompt Generator.

pub mod prompt_generator;
pub mod queue;
pub mod session;

pub use prompt_generator::{PromptDecision, PromptGenerator};
pub use queue::{is_stale, AudioOutputItem, TextStreamItem};
pub use session::{
    ChatMessage, ChatRole, InterruptionStatus, PlaybackStatus, Session, StageStatus,
};
