//! Bounded conversation history.

use hubpilot_core::{ContentBlock, Message, Role};

/// The most recent `size` non-blank messages of `history`.
///
/// Messages whose only content is empty text are dropped first. Leading
/// assistant messages are then dropped from the window so the
/// conversation sent to the model opens with a user turn.
pub fn window(history: &[Message], size: usize) -> Vec<Message> {
    let kept: Vec<&Message> = history.iter().filter(|m| !is_blank(m)).collect();
    let start = kept.len().saturating_sub(size);
    kept[start..]
        .iter()
        .skip_while(|m| m.role == Role::Assistant)
        .map(|m| (*m).clone())
        .collect()
}

fn is_blank(message: &Message) -> bool {
    message.content.iter().all(|block| match block {
        ContentBlock::Text { text } => text.trim().is_empty(),
        _ => false,
    })
}
