use moviebot_core::format::truncate_chars;
use moviebot_core::format::MenuButton;
use moviebot_core::{Button, ButtonAction, InboundEvent, Reply, ReplyMarkup};
use serde::Deserialize;
use serde_json::{json, Value};

/// Bot API limit for message text
pub const MESSAGE_TEXT_LIMIT: usize = 4096;

#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

/// Normalize an update into a dispatcher event.
///
/// Non-text messages, bot senders and callbacks without data yield `None`.
pub fn to_inbound(update: &Update) -> Option<InboundEvent> {
    if let Some(message) = &update.message {
        let from = message.from.as_ref().filter(|u| !u.is_bot)?;
        let text = message.text.as_deref()?;
        return Some(InboundEvent::from_message(from.id, message.chat.id, text));
    }

    if let Some(query) = &update.callback_query {
        let payload = query.data.as_deref()?;
        let chat_id = query
            .message
            .as_ref()
            .map(|m| m.chat.id)
            .unwrap_or(query.from.id);
        return Some(InboundEvent::from_callback(query.from.id, chat_id, payload));
    }

    None
}

fn button_json(button: &Button) -> Option<Value> {
    match &button.action {
        ButtonAction::Callback(action) => action
            .encode()
            .map(|data| json!({ "text": button.label, "callback_data": data })),
        ButtonAction::Url(url) => Some(json!({ "text": button.label, "url": url })),
    }
}

pub fn reply_markup_json(markup: &ReplyMarkup) -> Value {
    match markup {
        ReplyMarkup::Inline(rows) => {
            let keyboard: Vec<Vec<Value>> = rows
                .iter()
                .map(|row| row.iter().filter_map(button_json).collect::<Vec<_>>())
                .filter(|row| !row.is_empty())
                .collect();
            json!({ "inline_keyboard": keyboard })
        }
        ReplyMarkup::MainMenu => {
            let keyboard: Vec<Vec<Value>> = MenuButton::LAYOUT
                .iter()
                .map(|row| row.iter().map(|b| json!({ "text": b.label() })).collect())
                .collect();
            json!({ "keyboard": keyboard, "resize_keyboard": true })
        }
    }
}

/// Bot API method and JSON body that render `reply` into `chat_id`
pub fn outbound_request(chat_id: i64, reply: &Reply) -> (&'static str, Value) {
    let (method, mut body) = match reply {
        Reply::Text { text, .. } => (
            "sendMessage",
            json!({ "chat_id": chat_id, "text": truncate_chars(text, MESSAGE_TEXT_LIMIT) }),
        ),
        Reply::Photo { image_url, caption, .. } => (
            "sendPhoto",
            json!({ "chat_id": chat_id, "photo": image_url, "caption": caption }),
        ),
    };

    if let Some(markup) = reply.markup() {
        body["reply_markup"] = reply_markup_json(markup);
    }
    (method, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use moviebot_core::{CallbackAction, EventKind};

    fn parse_update(json: &str) -> Update {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_text_message_to_event() {
        let update = parse_update(
            r#"{
                "update_id": 10,
                "message": {
                    "message_id": 5,
                    "from": {"id": 42, "is_bot": false, "first_name": "A"},
                    "chat": {"id": 42, "type": "private"},
                    "date": 1700000000,
                    "text": "Interstellar"
                }
            }"#,
        );
        let event = to_inbound(&update).unwrap();
        assert_eq!(event.user_id, 42);
        assert_eq!(event.kind, EventKind::Text("Interstellar".to_string()));
    }

    #[test]
    fn test_callback_query_to_event() {
        let update = parse_update(
            r#"{
                "update_id": 11,
                "callback_query": {
                    "id": "abc",
                    "from": {"id": 42, "is_bot": false},
                    "message": {"message_id": 6, "chat": {"id": -100}},
                    "data": "w:add:157336"
                }
            }"#,
        );
        let event = to_inbound(&update).unwrap();
        assert_eq!(event.chat_id, -100);
        assert_eq!(event.kind, EventKind::Callback(CallbackAction::WatchAdd(157336)));
    }

    #[test]
    fn test_ignored_updates() {
        let sticker = parse_update(
            r#"{"update_id": 1, "message": {"message_id": 1, "from": {"id": 1}, "chat": {"id": 1}}}"#,
        );
        assert!(to_inbound(&sticker).is_none());

        let from_bot = parse_update(
            r#"{"update_id": 2, "message": {"message_id": 1, "from": {"id": 9, "is_bot": true}, "chat": {"id": 1}, "text": "hi"}}"#,
        );
        assert!(to_inbound(&from_bot).is_none());

        let edited = parse_update(r#"{"update_id": 3, "edited_message": {}}"#);
        assert!(to_inbound(&edited).is_none());
    }

    #[test]
    fn test_inline_keyboard_json() {
        let markup = ReplyMarkup::Inline(vec![
            vec![
                Button::url("▶️ Where to watch", "https://example.test"),
                Button::callback("dropped", CallbackAction::Unknown),
            ],
            vec![Button::callback("⬅️ Menu", CallbackAction::Menu)],
            vec![Button::callback("empty", CallbackAction::Unknown)],
        ]);
        let json = reply_markup_json(&markup);
        let rows = json["inline_keyboard"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].as_array().unwrap().len(), 1);
        assert_eq!(rows[0][0]["url"], "https://example.test");
        assert_eq!(rows[1][0]["callback_data"], "menu");
    }

    #[test]
    fn test_main_menu_json() {
        let json = reply_markup_json(&ReplyMarkup::MainMenu);
        assert_eq!(json["resize_keyboard"], true);
        assert_eq!(json["keyboard"][0][1]["text"], "🔥 Trending");
        assert_eq!(json["keyboard"][1][0]["text"], "⭐ Watchlist");
    }

    #[test]
    fn test_outbound_requests() {
        let long = "x".repeat(5000);
        let (method, body) = outbound_request(7, &Reply::text(long));
        assert_eq!(method, "sendMessage");
        assert_eq!(body["text"].as_str().unwrap().len(), MESSAGE_TEXT_LIMIT);
        assert!(body.get("reply_markup").is_none());

        let photo = Reply::Photo {
            image_url: "https://img.test/p.jpg".to_string(),
            caption: "Interstellar".to_string(),
            markup: Some(ReplyMarkup::MainMenu),
        };
        let (method, body) = outbound_request(7, &photo);
        assert_eq!(method, "sendPhoto");
        assert_eq!(body["photo"], "https://img.test/p.jpg");
        assert!(body["reply_markup"]["keyboard"].is_array());
    }
}
