//! Request message assembly.

use finchat_core::{ChatMessage, Message, Role};

/// Build the `messages` list for a backend request.
///
/// The system prompt comes first, then every prior turn in order, then the
/// new user message. `history` must not already contain the new message.
#[must_use]
pub fn build_llm_messages(
    system_prompt: &str,
    history: &[Message],
    new_message: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);

    messages.push(ChatMessage::new(Role::System, system_prompt));
    messages.extend(history.iter().map(Message::to_chat_message));
    messages.push(ChatMessage::new(Role::User, new_message));

    messages
}
