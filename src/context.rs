//! Context-window accounting for agent chat history.
//!
//! Token counts are a character heuristic (`chars / 4`), not a tokenizer.
//! When a history outgrows its budget the older turns are folded into one
//! `system` message carrying a Toon-encoded summary.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::toon;

/// One turn of a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self { role: role.into(), content: content.into() }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContextStats {
    pub message_count: usize,
    pub estimated_tokens: usize,
    pub max_tokens: usize,
    /// Share of `max_tokens` in use, one decimal place.
    pub utilization_percent: f64,
}

pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

/// Estimate for a single message, counted over its JSON form.
fn message_tokens(message: &ChatMessage) -> usize {
    serde_json::to_string(message).map_or(0, |s| estimate_tokens(&s))
}

pub fn history_tokens(history: &[ChatMessage]) -> usize {
    history.iter().map(message_tokens).sum()
}

pub fn stats(history: &[ChatMessage], max_tokens: usize) -> ContextStats {
    let estimated_tokens = history_tokens(history);
    let utilization_percent = if max_tokens == 0 {
        0.0
    } else {
        (estimated_tokens as f64 / max_tokens as f64 * 1000.0).round() / 10.0
    };
    ContextStats {
        message_count: history.len(),
        estimated_tokens,
        max_tokens,
        utilization_percent,
    }
}

/// Fold everything but the last `keep_last` messages into a summary when
/// the history exceeds `max_tokens`. Histories that fit, or that are too
/// short to fold, come back unchanged.
pub fn optimize_history(history: Vec<ChatMessage>, max_tokens: usize, keep_last: usize) -> Vec<ChatMessage> {
    let before = history_tokens(&history);
    if before <= max_tokens || history.len() <= keep_last {
        debug!(tokens = before, max_tokens, messages = history.len(), "history left as is");
        return history;
    }

    let split = history.len() - keep_last;
    let (older, recent) = history.split_at(split);

    let mut roles: Vec<&str> = Vec::new();
    for m in older {
        if !roles.contains(&m.role.as_str()) {
            roles.push(&m.role);
        }
    }
    let summary = json!({
        "type": "conversation_summary",
        "messages_count": older.len(),
        "roles": roles,
        "content_summary": "Previous conversation context",
    });

    let mut folded = Vec::with_capacity(keep_last + 1);
    folded.push(ChatMessage::new(
        "system",
        format!("Previous context summary (Toon format):\n{}", toon::encode(&summary)),
    ));
    folded.extend_from_slice(recent);

    info!(before, after = history_tokens(&folded), folded = older.len(), "history optimized");
    folded
}
