use std::collections::HashSet;

use crate::models::backend::HistoryEntry;
use crate::models::chat::{ Message, Role };

pub const DEFAULT_MAX_HISTORY_MESSAGES: usize = 8;
const MAX_LEADING_MESSAGES: usize = 3;

fn is_dialogue(message: &Message) -> bool {
    matches!(message.role, Role::User | Role::Assistant) && !message.typing
}

/// Picks the messages sent back as context: a few of the oldest turns for
/// grounding plus the most recent ones, never more than `max_messages`.
pub fn prepare_conversation_history(messages: &[Message], max_messages: usize) -> Vec<&Message> {
    let filtered: Vec<&Message> = messages
        .iter()
        .filter(|m| is_dialogue(m))
        .collect();
    if filtered.len() <= max_messages {
        return filtered;
    }

    let first_count = MAX_LEADING_MESSAGES.min(filtered.len() / 3).min(max_messages);
    let recent_count = max_messages - first_count;
    let first = &filtered[..first_count];
    let recent = &filtered[filtered.len() - recent_count..];

    let first_ids: HashSet<&str> = first
        .iter()
        .map(|m| m.id.as_str())
        .collect();
    let mut window: Vec<&Message> = first.to_vec();
    window.extend(recent.iter().filter(|m| !first_ids.contains(m.id.as_str())));
    window
}

pub fn to_history_entries(window: &[&Message]) -> Vec<HistoryEntry> {
    window
        .iter()
        .map(|m| HistoryEntry {
            role: m.role,
            content: m.text.clone(),
        })
        .collect()
}

/// Window plus wire conversion, as sent in `conversation_history`.
pub fn build_conversation_history(messages: &[Message], max_messages: usize) -> Vec<HistoryEntry> {
    to_history_entries(&prepare_conversation_history(messages, max_messages))
}
