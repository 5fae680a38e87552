//! The per-connection session record (§3 of the design).
//!
//! A [`Session`] is touched only by its own coordinator task; nothing here
//! is `Send`-guarded beyond what's needed to move the whole struct into
//! that task. Cross-session state (the tool registry, the background tool
//! scheduler) lives elsewhere, in `bargein-tools`.

use serde::{Deserialize, Serialize};

/// Per-stage lifecycle status shared by the STT worker, the Agent Runner,
/// the TTS worker, and the tool dispatch path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    #[default]
    Idle,
    Processing,
    Streaming,
}

/// Playback dispatch gate, mutated by the Interruption Handler and the
/// Decision Task and read by the Playback Dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Active,
    Paused,
}

/// Whether an interruption has been reacted to but not yet resolved by the
/// Decision Task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InterruptionStatus {
    #[default]
    Idle,
    Processing,
    Active,
}

/// A single turn in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Agent,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
    pub fn agent(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Agent,
            content: content.into(),
        }
    }
}

/// The mutable per-connection record (§3 DATA MODEL).
///
/// All fields are public: the session is owned exclusively by its
/// coordinator task (`bargein-gateway::runtime`), which is the only
/// writer. Nothing here spawns tasks or performs I/O — that's the
/// coordinator's job.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,

    pub stt_status: StageStatus,
    pub agent_status: StageStatus,
    pub tts_status: StageStatus,
    pub tool_status: StageStatus,

    pub playback_status: PlaybackStatus,
    pub interruption_status: InterruptionStatus,

    /// Last known mirror of the client's audio element state.
    pub client_playback_active: bool,
    /// Captured at the moment the pause reaction decides this is an
    /// interruption; used by the Decision Task to pick resume vs. reset.
    pub client_was_active_before_interruption: bool,
    /// True from Agent Runner start until TTS end-of-stream AND the client
    /// reports playback complete.
    pub response_in_progress: bool,

    /// Increments on every Regenerate decision. Workers tag their outputs
    /// with the id in effect when produced; consumers drop stale items.
    pub generation_id: u64,

    pub chat_history: Vec<ChatMessage>,
    /// Transcripts accumulated since the last Decision Task completion.
    pub stt_output_list: Vec<String>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            stt_status: StageStatus::Idle,
            agent_status: StageStatus::Idle,
            tts_status: StageStatus::Idle,
            tool_status: StageStatus::Idle,
            playback_status: PlaybackStatus::Idle,
            interruption_status: InterruptionStatus::Idle,
            client_playback_active: false,
            client_was_active_before_interruption: false,
            response_in_progress: false,
            generation_id: 0,
            chat_history: Vec::new(),
            stt_output_list: Vec::new(),
        }
    }

    /// Whether every stage is idle and there's nothing in flight — the
    /// condition under which a `speech_start` is the beginning of a fresh
    /// turn rather than an interruption (§4.2 step 1).
    pub fn is_fully_idle(&self) -> bool {
        self.stt_status == StageStatus::Idle
            && self.agent_status == StageStatus::Idle
            && self.tts_status == StageStatus::Idle
            && self.tool_status == StageStatus::Idle
            && self.playback_status == PlaybackStatus::Idle
            && !self.client_playback_active
            && !self.response_in_progress
    }

    /// Append a chat message, upholding invariant 2: `chatHistory` never
    /// contains two adjacent messages with the same role. Call sites that
    /// need to replace rather than append (e.g. fusing an interruption
    /// onto the previous user message) should mutate `chat_history`
    /// directly instead.
    pub fn push_history(&mut self, msg: ChatMessage) {
        debug_assert!(
            self.chat_history.last().map(|m| m.role) != Some(msg.role),
            "chat_history must never hold two adjacent same-role messages"
        );
        self.chat_history.push(msg);
    }

    /// Drain and return the accumulated STT outputs (Decision Task step 2).
    pub fn take_stt_outputs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.stt_output_list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_is_fully_idle() {
        let s = Session::new("s1");
        assert!(s.is_fully_idle());
    }

    #[test]
    fn streaming_agent_is_not_idle() {
        let mut s = Session::new("s1");
        s.agent_status = StageStatus::Streaming;
        assert!(!s.is_fully_idle());
    }

    #[test]
    #[should_panic]
    fn push_history_rejects_adjacent_same_role_in_debug() {
        let mut s = Session::new("s1");
        s.push_history(ChatMessage::user("hi"));
        s.push_history(ChatMessage::user("again"));
    }

    #[test]
    fn take_stt_outputs_drains_and_clears() {
        let mut s = Session::new("s1");
        s.stt_output_list.push("hello".into());
        s.stt_output_list.push("world".into());
        let out = s.take_stt_outputs();
        assert_eq!(out, vec!["hello".to_string(), "world".to_string()]);
        assert!(s.stt_output_list.is_empty());
    }
}
