use crate::callback::CallbackAction;

#[derive(Debug, Clone, PartialEq)]
pub enum ButtonAction {
    Callback(CallbackAction),
    Url(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub label: String,
    pub action: ButtonAction,
}

impl Button {
    pub fn callback(label: impl Into<String>, action: CallbackAction) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Callback(action),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Url(url.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplyMarkup {
    /// Buttons attached to the message itself
    Inline(Vec<Vec<Button>>),
    /// The persistent four-button main menu under the input field
    MainMenu,
}

/// One outbound render for the transport
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text {
        text: String,
        markup: Option<ReplyMarkup>,
    },
    Photo {
        image_url: String,
        caption: String,
        markup: Option<ReplyMarkup>,
    },
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text {
            text: text.into(),
            markup: None,
        }
    }

    pub fn with_markup(self, new_markup: ReplyMarkup) -> Self {
        match self {
            Reply::Text { text, .. } => Reply::Text {
                text,
                markup: Some(new_markup),
            },
            Reply::Photo { image_url, caption, .. } => Reply::Photo {
                image_url,
                caption,
                markup: Some(new_markup),
            },
        }
    }

    /// Message text or photo caption
    pub fn body(&self) -> &str {
        match self {
            Reply::Text { text, .. } => text,
            Reply::Photo { caption, .. } => caption,
        }
    }

    pub fn markup(&self) -> Option<&ReplyMarkup> {
        match self {
            Reply::Text { markup, .. } | Reply::Photo { markup, .. } => markup.as_ref(),
        }
    }

    /// Inline rows, empty for the main menu or no markup
    pub fn inline_rows(&self) -> &[Vec<Button>] {
        match self.markup() {
            Some(ReplyMarkup::Inline(rows)) => rows,
            _ => &[],
        }
    }
}
