use moviebot_models::UserId;

use crate::callback::CallbackAction;

/// Chat to answer in; for private chats it equals the user id
pub type ChatId = i64;

/// One inbound chat event, already normalized by the transport
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub user_id: UserId,
    pub chat_id: ChatId,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// `/name args...`, name lowercased and stripped of any `@botname` suffix
    Command { name: String, args: String },
    Text(String),
    Callback(CallbackAction),
}

impl InboundEvent {
    pub fn new(user_id: UserId, chat_id: ChatId, kind: EventKind) -> Self {
        Self { user_id, chat_id, kind }
    }

    /// Parse raw message text into a command or plain text event
    pub fn from_message(user_id: UserId, chat_id: ChatId, text: &str) -> Self {
        Self::new(user_id, chat_id, parse_message(text))
    }

    pub fn from_callback(user_id: UserId, chat_id: ChatId, payload: &str) -> Self {
        Self::new(user_id, chat_id, EventKind::Callback(CallbackAction::decode(payload)))
    }
}

fn parse_message(text: &str) -> EventKind {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return EventKind::Text(trimmed.to_string());
    };

    let (head, args) = match rest.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim()),
        None => (rest, ""),
    };
    let name = head.split('@').next().unwrap_or(head).to_lowercase();

    if name.is_empty() {
        return EventKind::Text(trimmed.to_string());
    }

    EventKind::Command {
        name,
        args: args.to_string(),
    }
}
