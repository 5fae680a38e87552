//! Wire protocol for the client-facing duplex websocket connection.
//!
//! One [`ClientEvent`] / [`ServerEvent`] pair per connection. Both are
//! plain JSON with a `type` (client) / `event` (server) tag, matching the
//! event tables in the orchestrator's external interface.

use serde::{Deserialize, Serialize};

/// Events the client sends to the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// VAD detected the user has started speaking.
    SpeechStart,
    /// Full utterance audio buffer, base64-encoded.
    SpeechEnd { audio: String },
    /// Client began playing a previously sent audio frame.
    ClientPlaybackStarted,
    /// Client's audio queue has fully drained.
    ClientPlaybackComplete,
}

/// Events the server sends to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Sent once right after the connection is accepted.
    Connected { session_id: String, message: String },
    /// A frame to enqueue and play, base64-encoded.
    PlayAudio { audio: String },
    /// Pause immediately; the client retains its local queue.
    StopPlayback {
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Legacy alias for `stop_playback` with the same effect.
    PlaybackPause,
    /// Resume playback from the paused point.
    PlaybackResume,
    /// Discard any buffered audio — the generation is stale.
    PlaybackReset,
    /// Fatal; the server will close the connection after sending this.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speech_end_round_trips() {
        let ev = ClientEvent::SpeechEnd {
            audio: "YWJj".into(),
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert_eq!(json, r#"{"type":"speech_end","audio":"YWJj"}"#);
        let back: ClientEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ev);
    }

    #[test]
    fn unit_variant_tags_only_carry_type() {
        let json = serde_json::to_string(&ClientEvent::SpeechStart).unwrap();
        assert_eq!(json, r#"{"type":"speech_start"}"#);
    }

    #[test]
    fn stop_playback_omits_message_when_none() {
        let json = serde_json::to_string(&ServerEvent::StopPlayback { message: None }).unwrap();
        assert_eq!(json, r#"{"event":"stop_playback"}"#);
    }

    #[test]
    fn connected_serializes_with_session_id() {
        let ev = ServerEvent::Connected {
            session_id: "abc-123".into(),
            message: "ready".into(),
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert_eq!(
            json,
            r#"{"event":"connected","session_id":"abc-123","message":"ready"}"#
        );
    }
}
