//! Routing policy for inbound messages.
//!
//! Pure decision logic: given a message and the configuration, pick the
//! single outbound request to make. Rules are evaluated in order:
//!
//! 1. a recognised command gets its canned description back
//! 2. anything else in a private chat is forwarded to the staff group
//! 3. in a group, a reply to a forwarded message is relayed to the
//!    forward's original author; everything else gets a prompt

use teloxide::types::{ChatId, MessageId};

use crate::config::{Config, LinksConfig};
use crate::platform::IncomingMessage;

pub const SELECT_REPLY_PROMPT: &str = "Select reply message";
pub const CHOOSE_COLLOCUTOR_PROMPT: &str = "Choice reply collocutor";
pub const SUPPORTED_FORMATS: &str =
    "I understand next format: text, photo, sticker, any document";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    About,
    Feedback,
    Ad,
    Suggest,
}

/// Every accepted surface form. One command may have several literals.
pub const COMMANDS: &[(&str, Command)] = &[
    ("/start", Command::Start),
    ("/about", Command::About),
    ("О проекте", Command::About),
    ("О канале", Command::About),
    ("/feedback", Command::Feedback),
    ("Оставить отзыв", Command::Feedback),
    ("/ad", Command::Ad),
    ("Реклама", Command::Ad),
    ("Условия рекламы", Command::Ad),
    ("/suggest", Command::Suggest),
    ("Предложить статью", Command::Suggest),
    ("Предложить новость", Command::Suggest),
];

impl Command {
    /// Exact, case-sensitive match against the command table
    pub fn parse(text: &str) -> Option<Self> {
        COMMANDS
            .iter()
            .find(|(literal, _)| *literal == text)
            .map(|(_, command)| *command)
    }

    pub fn description<'a>(&self, config: &'a Config) -> &'a str {
        let d = &config.description;
        match self {
            Command::Start => &d.start,
            Command::About => &d.about,
            Command::Feedback => &d.feedback,
            Command::Ad => &d.ad,
            Command::Suggest => &d.suggest,
        }
    }

    /// URL buttons attached to the description, one per keyboard row
    pub fn keyboard(&self, links: &LinksConfig) -> Vec<LinkButton> {
        match self {
            Command::About => vec![
                LinkButton::new("Перейти на сайт", &links.website),
                LinkButton::new("Подписаться medium", &links.medium),
                LinkButton::new("Подписаться VK", &links.vk),
            ],
            Command::Ad => vec![LinkButton::new("Перейти", &links.ad)],
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkButton {
    pub label: &'static str,
    pub url: String,
}

impl LinkButton {
    fn new(label: &'static str, url: &str) -> Self {
        Self {
            label,
            url: url.to_string(),
        }
    }
}

/// One outbound Bot API request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Canned description: markdown, no link preview, optional URL keyboard
    Describe {
        chat: ChatId,
        text: String,
        keyboard: Vec<LinkButton>,
    },
    /// Platform-level forward keeping the original sender attribution
    Forward {
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    },
    /// Plain text message
    Text { chat: ChatId, text: String },
    Photo { chat: ChatId, file_id: String },
    Document { chat: ChatId, file_id: String },
    Sticker { chat: ChatId, file_id: String },
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Describe { .. } => "description",
            Action::Forward { .. } => "forward",
            Action::Text { .. } => "text",
            Action::Photo { .. } => "photo",
            Action::Document { .. } => "document",
            Action::Sticker { .. } => "sticker",
        }
    }
}

pub fn route(msg: &IncomingMessage, config: &Config) -> Action {
    if let Some(action) = describe(msg, config) {
        return action;
    }

    if msg.is_private {
        return Action::Forward {
            to: ChatId(config.group_id),
            from: msg.sender_id,
            message_id: msg.message_id,
        };
    }

    let Some(replied) = &msg.reply_to else {
        return prompt(msg.chat_id, SELECT_REPLY_PROMPT);
    };

    match replied.forward_origin {
        Some(user) => relay(msg, ChatId::from(user)),
        None => prompt(msg.chat_id, CHOOSE_COLLOCUTOR_PROMPT),
    }
}

/// A command with an empty configured text counts as unrecognised
fn describe(msg: &IncomingMessage, config: &Config) -> Option<Action> {
    let command = Command::parse(msg.text.as_deref()?)?;
    let text = command.description(config);
    if text.is_empty() {
        return None;
    }

    Some(Action::Describe {
        chat: msg.chat_id,
        text: text.to_string(),
        keyboard: command.keyboard(&config.links),
    })
}

/// Precedence: photo, document, sticker, text. Only the first photo size
/// is relayed.
fn relay(msg: &IncomingMessage, to: ChatId) -> Action {
    if let Some(file_id) = msg.photos.first() {
        return Action::Photo {
            chat: to,
            file_id: file_id.clone(),
        };
    }
    if let Some(file_id) = &msg.document {
        return Action::Document {
            chat: to,
            file_id: file_id.clone(),
        };
    }
    if let Some(file_id) = &msg.sticker {
        return Action::Sticker {
            chat: to,
            file_id: file_id.clone(),
        };
    }

    match msg.text.as_deref() {
        Some(text) if !text.is_empty() => Action::Text {
            chat: to,
            text: text.to_string(),
        },
        _ => prompt(msg.chat_id, SUPPORTED_FORMATS),
    }
}

fn prompt(chat: ChatId, text: &str) -> Action {
    Action::Text {
        chat,
        text: text.to_string(),
    }
}
