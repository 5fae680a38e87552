//! Prompt Generator (§4.7, component C8).
//!
//! A pure function over `(transcripts, chatHistory, isInterruption)`. It
//! never touches I/O or a live `Session` — the Decision Task is the only
//! caller, and installs the result back onto the session itself.

use crate::session::{ChatMessage, ChatRole};
use std::collections::HashSet;

/// Outcome of [`PromptGenerator::generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptDecision {
    /// `false` for a no-op (empty transcript or false alarm); `true` when
    /// the Decision Task should regenerate.
    pub needs_new_prompt: bool,
    /// The merged, whitespace-collapsed transcript text.
    pub prompt: String,
    /// `chat_history` with the unheard agent response dropped and the new
    /// text fused onto the previous user message, when this was a real
    /// interruption (otherwise unchanged).
    pub cleaned_history: Vec<ChatMessage>,
}

/// Holds the configurable backchannel/false-alarm phrase set.
#[derive(Debug, Clone)]
pub struct PromptGenerator {
    false_alarm_phrases: HashSet<String>,
}

impl PromptGenerator {
    pub fn new(phrases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            false_alarm_phrases: phrases.into_iter().map(|p| p.into().to_lowercase()).collect(),
        }
    }

    pub fn add_false_alarm_phrase(&mut self, phrase: &str) {
        self.false_alarm_phrases.insert(phrase.trim().to_lowercase());
    }

    pub fn remove_false_alarm_phrase(&mut self, phrase: &str) {
        self.false_alarm_phrases.remove(&phrase.trim().to_lowercase());
    }

    pub fn false_alarm_phrases(&self) -> impl Iterator<Item = &str> {
        self.false_alarm_phrases.iter().map(|s| s.as_str())
    }

    /// Merge every transcript into a single whitespace-collapsed string.
    fn merge(transcripts: &[String]) -> String {
        transcripts
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// A merged transcript is a false alarm iff its lowercased, trimmed
    /// form is exactly a backchannel phrase, or it's ≤ 2 tokens and
    /// contains one as a substring.
    fn is_false_alarm(&self, merged: &str) -> bool {
        let lower = merged.to_lowercase();
        let lower = lower.trim();
        if self.false_alarm_phrases.contains(lower) {
            return true;
        }
        let word_count = lower.split_whitespace().count();
        if word_count <= 2 {
            return self
                .false_alarm_phrases
                .iter()
                .any(|phrase| lower.contains(phrase.as_str()));
        }
        false
    }

    /// Drop an unheard trailing agent message and fuse the new text onto
    /// the previous user message.
    fn fuse_on_interruption(history: &[ChatMessage], new_text: &str) -> Vec<ChatMessage> {
        let mut cleaned = history.to_vec();
        if matches!(cleaned.last(), Some(m) if m.role == ChatRole::Agent) {
            cleaned.pop();
            if let Some(last) = cleaned.last_mut() {
                if last.role == ChatRole::User {
                    last.content = format!("{} {}", last.content, new_text);
                }
            }
        }
        cleaned
    }

    /// Run the algorithm of §4.7.
    pub fn generate(
        &self,
        transcripts: &[String],
        chat_history: &[ChatMessage],
        is_interruption: bool,
    ) -> PromptDecision {
        let merged = Self::merge(transcripts);

        if merged.trim().is_empty() {
            return PromptDecision {
                needs_new_prompt: false,
                prompt: String::new(),
                cleaned_history: chat_history.to_vec(),
            };
        }

        if !is_interruption {
            return PromptDecision {
                needs_new_prompt: true,
                prompt: merged,
                cleaned_history: chat_history.to_vec(),
            };
        }

        if self.is_false_alarm(&merged) {
            return PromptDecision {
                needs_new_prompt: false,
                prompt: merged,
                cleaned_history: chat_history.to_vec(),
            };
        }

        let cleaned_history = Self::fuse_on_interruption(chat_history, &merged);
        PromptDecision {
            needs_new_prompt: true,
            prompt: merged,
            cleaned_history,
        }
    }
}

impl Default for PromptGenerator {
    fn default() -> Self {
        Self::new([
            "uh huh", "uh-huh", "mhmm", "mm-hmm", "okay", "ok", "yeah", "yep", "yes", "got it",
            "i see", "right", "sure", "alright", "continue", "go on", "go ahead",
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gen() -> PromptGenerator {
        PromptGenerator::default()
    }

    #[test]
    fn empty_transcripts_need_no_prompt() {
        let d = gen().generate(&[], &[], false);
        assert!(!d.needs_new_prompt);
        assert_eq!(d.prompt, "");
    }

    #[test]
    fn whitespace_only_transcripts_need_no_prompt() {
        let d = gen().generate(&["   ".into()], &[], true);
        assert!(!d.needs_new_prompt);
    }

    #[test]
    fn non_interruption_is_always_a_new_turn() {
        let d = gen().generate(&["hello".into(), "there".into()], &[], false);
        assert!(d.needs_new_prompt);
        assert_eq!(d.prompt, "hello there");
    }

    #[test]
    fn merge_collapses_whitespace() {
        let d = gen().generate(&["  hello   world  ".into()], &[], false);
        assert_eq!(d.prompt, "hello world");
    }

    #[test]
    fn exact_backchannel_phrase_is_false_alarm() {
        let history = vec![ChatMessage::user("q"), ChatMessage::agent("a")];
        let d = gen().generate(&["uh huh".into()], &history, true);
        assert!(!d.needs_new_prompt);
        assert_eq!(d.cleaned_history, history);
    }

    #[test]
    fn short_text_containing_backchannel_is_false_alarm() {
        let d = gen().generate(&["yeah okay".into()], &[], true);
        assert!(!d.needs_new_prompt);
    }

    #[test]
    fn long_text_containing_backchannel_substring_is_real() {
        // More than 2 tokens, so the substring rule doesn't apply even
        // though "okay" appears.
        let d = gen().generate(&["okay but actually tell me a joke".into()], &[], true);
        assert!(d.needs_new_prompt);
    }

    #[test]
    fn real_interruption_drops_unheard_agent_and_fuses_onto_previous_user() {
        let history = vec![
            ChatMessage::user("how are you doing"),
            ChatMessage::agent("I'm doing great, thanks for"),
        ];
        let d = gen().generate(&["stop tell me a joke".into()], &history, true);
        assert!(d.needs_new_prompt);
        assert_eq!(d.cleaned_history.len(), 1);
        assert_eq!(d.cleaned_history[0].role, ChatRole::User);
        assert_eq!(
            d.cleaned_history[0].content,
            "how are you doing stop tell me a joke"
        );
    }

    #[test]
    fn real_interruption_with_no_agent_tail_leaves_history_untouched() {
        let history = vec![ChatMessage::user("hello there")];
        let d = gen().generate(&["stop tell me a joke".into()], &history, true);
        assert!(d.needs_new_prompt);
        assert_eq!(d.cleaned_history, history);
    }

    #[test]
    fn custom_phrase_can_be_added_and_removed() {
        let mut g = gen();
        g.add_false_alarm_phrase("roger that");
        let d = g.generate(&["roger that".into()], &[], true);
        assert!(!d.needs_new_prompt);

        g.remove_false_alarm_phrase("roger that");
        let d2 = g.generate(&["roger that".into()], &[], true);
        assert!(d2.needs_new_prompt);
    }
}
