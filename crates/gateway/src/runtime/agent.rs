//! Agent Runner (§4.5, component C5): drives the LLM stream, batches
//! tokens into sentences for the TTS Worker, and runs the tool-call loop
//! against the session's [`ToolTable`] (§4.6).

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use bargein_domain::config::Config;
use bargein_domain::stream::StreamEvent;
use bargein_domain::tool::{ContentPart, Message, MessageContent, Role, ToolCall};
use bargein_providers::{ChatRequest, LlmProvider};
use bargein_session::queue::TextStreamItem;
use bargein_session::ChatMessage;
use bargein_session::ChatRole;

use crate::runtime::coordinator::{AgentDone, Coordinator};
use crate::runtime::tools::ToolTable;

const SENTENCE_BREAKS: [char; 4] = ['.', '!', '?', '\n'];

/// §7: "A failed LLM stream surfaces as a spoken fallback sentence."
const LLM_FAILURE_FALLBACK: &str = "I'm experiencing technical difficulties.";

/// Spawn the Agent Runner for the session's current generation (§4.4
/// Branch B step 5). Installs a fresh cancellation token on the
/// coordinator before spawning so the next pause reaction or Decision
/// Task run can cancel it.
pub(crate) fn spawn_agent_runner(coord: &mut Coordinator) {
    let cancel = CancellationToken::new();
    coord.agent_cancel = Some(cancel.clone());

    // §4.5 step 1: true from here until TTS end-of-stream AND the client
    // reports playback complete (see `ClientPlaybackComplete` in
    // coordinator.rs) — not just until `agentStatus`/`ttsStatus` go IDLE.
    coord.session.response_in_progress = true;

    let turn_span = tracing::info_span!(
        "turn",
        generation_id = %coord.session.generation_id,
        session_id = %coord.session.id,
        "otel.kind" = "INTERNAL",
    );
    tokio::spawn(
        run(
            coord.session.generation_id,
            coord.session.chat_history.clone(),
            coord.config.clone(),
            coord.llm.clone(),
            coord.tool_table.clone(),
            coord.text_tx.clone(),
            coord.agent_done_tx(),
            coord.agent_streaming_tx(),
            cancel,
        )
        .instrument(turn_span),
    );
}

fn to_llm_message(msg: &ChatMessage) -> Message {
    match msg.role {
        ChatRole::User => Message::user(msg.content.clone()),
        ChatRole::Agent => Message::assistant(msg.content.clone()),
    }
}

fn build_assistant_tool_message(text: &str, tool_calls: &[ToolCall]) -> Message {
    let mut parts = Vec::new();
    if !text.is_empty() {
        parts.push(ContentPart::Text { text: text.to_string() });
    }
    for call in tool_calls {
        parts.push(ContentPart::ToolUse {
            id: call.call_id.clone(),
            name: call.tool_name.clone(),
            input: call.arguments.clone(),
        });
    }
    Message { role: Role::Assistant, content: MessageContent::Parts(parts) }
}

/// Flush the trimmed sentence buffer as a `Sentence` item, no-op if empty.
async fn flush_sentence(text_tx: &mpsc::Sender<TextStreamItem>, generation_id: u64, buf: &mut String) {
    let trimmed = buf.trim().to_string();
    buf.clear();
    if trimmed.is_empty() {
        return;
    }
    let _ = text_tx.send(TextStreamItem::Sentence { generation_id, text: trimmed }).await;
}

#[allow(clippy::too_many_arguments)]
async fn run(
    generation_id: u64,
    history: Vec<ChatMessage>,
    config: Arc<Config>,
    llm: Arc<dyn LlmProvider>,
    tool_table: Arc<ToolTable>,
    text_tx: mpsc::Sender<TextStreamItem>,
    agent_done_tx: mpsc::Sender<AgentDone>,
    agent_streaming_tx: mpsc::Sender<u64>,
    cancel: CancellationToken,
) {
    let llm_cfg = config.llm.as_ref();
    let mut messages = Vec::new();
    if let Some(system_prompt) = llm_cfg.and_then(|c| c.system_prompt.as_deref()) {
        messages.push(Message::system(system_prompt));
    }
    messages.extend(history.iter().map(to_llm_message));

    let tools_enabled = llm_cfg.map(|c| c.tools_enabled).unwrap_or(true);
    let tool_defs = if tools_enabled { tool_table.definitions() } else { Vec::new() };

    let mut sentence_buf = String::new();
    let mut full_text = String::new();
    let mut streaming_notified = false;

    loop {
        let req = ChatRequest {
            messages: messages.clone(),
            tools: tool_defs.clone(),
            temperature: llm_cfg.map(|c| c.temperature),
            max_tokens: None,
            model: llm_cfg.map(|c| c.model.clone()),
        };

        let llm_call_span = tracing::info_span!(
            "llm.call",
            "otel.kind" = "CLIENT",
            model = req.model.as_deref().unwrap_or("default"),
        );

        // Each suspension point of the LLM interaction (connect, then every
        // poll of the stream) is instrumented individually rather than
        // entered as a guard held across `.await` — a `Span::Entered` guard
        // is deliberately `!Send` and would make this spawned task's future
        // non-`Send`.
        let mut stream = match llm.chat_stream(&req).instrument(llm_call_span.clone()).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "llm stream failed to start");
                if full_text.is_empty() {
                    full_text.push_str(LLM_FAILURE_FALLBACK);
                    let _ = text_tx
                        .send(TextStreamItem::Sentence {
                            generation_id,
                            text: LLM_FAILURE_FALLBACK.to_string(),
                        })
                        .await;
                }
                break;
            }
        };

        let mut round_text = String::new();
        let mut pending_calls: Vec<ToolCall> = Vec::new();

        'round: loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    // §4.2 step 9: only reached when the Interruption
                    // Handler cancels a pre-streaming Agent Runner; once
                    // tokens have started the handler lets it finish
                    // instead, so this return drops nothing a client saw.
                    return;
                }
                next = stream.next().instrument(llm_call_span.clone()) => {
                    let Some(event) = next else { break 'round };
                    match event {
                        Ok(StreamEvent::Token { text }) => {
                            if !streaming_notified {
                                streaming_notified = true;
                                let _ = agent_streaming_tx.send(generation_id).await;
                            }
                            let has_break = text.contains(|c: char| SENTENCE_BREAKS.contains(&c));
                            full_text.push_str(&text);
                            round_text.push_str(&text);
                            sentence_buf.push_str(&text);
                            if has_break {
                                flush_sentence(&text_tx, generation_id, &mut sentence_buf).await;
                            }
                        }
                        Ok(StreamEvent::Thinking { .. }) => {}
                        Ok(StreamEvent::ToolCallStarted { .. }) => {}
                        Ok(StreamEvent::ToolCallDelta { .. }) => {}
                        Ok(StreamEvent::ToolCallFinished { call_id, tool_name, arguments }) => {
                            pending_calls.push(ToolCall { call_id, tool_name, arguments });
                        }
                        Ok(StreamEvent::Done { .. }) => break 'round,
                        Ok(StreamEvent::Error { message }) => {
                            tracing::warn!(error = %message, "llm stream error");
                            break 'round;
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "llm stream error");
                            break 'round;
                        }
                    }
                }
            }
        }

        if pending_calls.is_empty() {
            break;
        }

        messages.push(build_assistant_tool_message(&round_text, &pending_calls));
        for call in &pending_calls {
            let tool_span = tracing::info_span!("tool.call", tool_name = %call.tool_name);
            let summary = tool_table
                .invoke(&call.tool_name, call.arguments.clone())
                .instrument(tool_span)
                .await;
            messages.push(Message::tool_result(call.call_id.clone(), summary));
        }
    }

    flush_sentence(&text_tx, generation_id, &mut sentence_buf).await;
    let _ = text_tx.send(TextStreamItem::EndOfStream { generation_id }).await;
    let _ = agent_done_tx.send(AgentDone { generation_id, full_text }).await;
}
