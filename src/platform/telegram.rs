use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use teloxide::adaptors::Trace;
use teloxide::prelude::*;
use teloxide::types::{
    ChatId, FileId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, LinkPreviewOptions,
    ParseMode,
};

use crate::platform::{IncomingMessage, Outbox, RepliedMessage};
use crate::router::{Action, LinkButton};

impl IncomingMessage {
    pub fn from_telegram(msg: &Message) -> Self {
        Self {
            chat_id: msg.chat.id,
            is_private: msg.chat.is_private(),
            sender_id: msg
                .from
                .as_ref()
                .map(|user| ChatId::from(user.id))
                .unwrap_or(msg.chat.id),
            message_id: msg.id,
            text: msg.text().map(str::to_string),
            photos: msg
                .photo()
                .map(|sizes| sizes.iter().map(|p| p.file.id.to_string()).collect())
                .unwrap_or_default(),
            document: msg.document().map(|d| d.file.id.to_string()),
            sticker: msg.sticker().map(|s| s.file.id.to_string()),
            reply_to: msg.reply_to_message().map(|replied| RepliedMessage {
                forward_origin: replied.forward_from_user().map(|user| user.id),
            }),
        }
    }
}

/// Bot API handle. Request tracing is switched by the settings chosen at startup.
pub type TelegramBot = Trace<Bot>;

/// Sends routed actions through the Bot API
pub struct TelegramOutbox {
    bot: TelegramBot,
}

impl TelegramOutbox {
    pub fn new(bot: TelegramBot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Outbox for TelegramOutbox {
    type Error = anyhow::Error;

    async fn deliver(&self, action: &Action) -> Result<()> {
        match action {
            Action::Describe {
                chat,
                text,
                keyboard,
            } => {
                let mut request = self
                    .bot
                    .send_message(*chat, text.as_str())
                    .parse_mode(legacy_markdown())
                    .link_preview_options(no_preview());
                if !keyboard.is_empty() {
                    request = request.reply_markup(link_keyboard(keyboard)?);
                }
                request.await.context("sendMessage (description)")?;
            }
            Action::Forward {
                to,
                from,
                message_id,
            } => {
                self.bot
                    .forward_message(*to, *from, *message_id)
                    .await
                    .context("forwardMessage")?;
            }
            Action::Text { chat, text } => {
                self.bot
                    .send_message(*chat, text.as_str())
                    .await
                    .context("sendMessage")?;
            }
            Action::Photo { chat, file_id } => {
                self.bot
                    .send_photo(*chat, stored_file(file_id))
                    .await
                    .context("sendPhoto")?;
            }
            Action::Document { chat, file_id } => {
                self.bot
                    .send_document(*chat, stored_file(file_id))
                    .await
                    .context("sendDocument")?;
            }
            Action::Sticker { chat, file_id } => {
                self.bot
                    .send_sticker(*chat, stored_file(file_id))
                    .await
                    .context("sendSticker")?;
            }
        }
        Ok(())
    }
}

/// Canned descriptions are written in the Bot API's legacy Markdown dialect
#[allow(deprecated)]
fn legacy_markdown() -> ParseMode {
    ParseMode::Markdown
}

fn stored_file(file_id: &str) -> InputFile {
    InputFile::file_id(FileId::from(file_id.to_string()))
}

fn no_preview() -> LinkPreviewOptions {
    LinkPreviewOptions {
        is_disabled: true,
        url: None,
        prefer_small_media: false,
        prefer_large_media: false,
        show_above_text: false,
    }
}

/// One URL button per row
fn link_keyboard(buttons: &[LinkButton]) -> Result<InlineKeyboardMarkup> {
    let rows = buttons
        .iter()
        .map(|button| -> Result<Vec<InlineKeyboardButton>> {
            let url = Url::parse(&button.url)
                .with_context(|| format!("Invalid link for {:?}: {:?}", button.label, button.url))?;
            Ok(vec![InlineKeyboardButton::url(button.label, url)])
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(InlineKeyboardMarkup::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use teloxide::types::{InlineKeyboardButtonKind, MessageId, UserId};

    fn message(value: serde_json::Value) -> Message {
        serde_json::from_value(value).unwrap()
    }

    fn customer() -> serde_json::Value {
        json!({"id": 4242, "is_bot": false, "first_name": "Ann"})
    }

    fn staff_group() -> serde_json::Value {
        json!({"id": -100500, "type": "supergroup", "title": "Staff"})
    }

    #[test]
    fn test_private_text_message() {
        let msg = message(json!({
            "message_id": 31,
            "date": 1700000000,
            "chat": {"id": 4242, "type": "private", "first_name": "Ann"},
            "from": customer(),
            "text": "/about"
        }));

        let incoming = IncomingMessage::from_telegram(&msg);
        assert_eq!(incoming.chat_id, ChatId(4242));
        assert!(incoming.is_private);
        assert_eq!(incoming.sender_id, ChatId(4242));
        assert_eq!(incoming.message_id, MessageId(31));
        assert_eq!(incoming.text.as_deref(), Some("/about"));
        assert!(incoming.photos.is_empty());
        assert_eq!(incoming.reply_to, None);
    }

    #[test]
    fn test_group_photo_reply_to_forward() {
        let msg = message(json!({
            "message_id": 90,
            "date": 1700000100,
            "chat": staff_group(),
            "from": {"id": 777, "is_bot": false, "first_name": "Staff"},
            "photo": [
                {"file_id": "small", "file_unique_id": "u1", "width": 90, "height": 90, "file_size": 1000},
                {"file_id": "large", "file_unique_id": "u2", "width": 800, "height": 800, "file_size": 90000}
            ],
            "reply_to_message": {
                "message_id": 55,
                "date": 1700000000,
                "chat": staff_group(),
                "forward_origin": {"type": "user", "date": 1699999999, "sender_user": customer()},
                "text": "I have a question"
            }
        }));

        let incoming = IncomingMessage::from_telegram(&msg);
        assert!(!incoming.is_private);
        assert_eq!(incoming.chat_id, ChatId(-100500));
        assert_eq!(incoming.photos, vec!["small".to_string(), "large".to_string()]);
        assert_eq!(incoming.text, None);
        assert_eq!(
            incoming.reply_to,
            Some(RepliedMessage {
                forward_origin: Some(UserId(4242))
            })
        );
    }

    #[test]
    fn test_hidden_forward_origin_has_no_user() {
        let msg = message(json!({
            "message_id": 91,
            "date": 1700000100,
            "chat": staff_group(),
            "text": "hello",
            "reply_to_message": {
                "message_id": 56,
                "date": 1700000000,
                "chat": staff_group(),
                "forward_origin": {"type": "hidden_user", "date": 1699999999, "sender_user_name": "Anon"},
                "text": "psst"
            }
        }));

        let incoming = IncomingMessage::from_telegram(&msg);
        assert_eq!(incoming.reply_to, Some(RepliedMessage::default()));
    }

    #[test]
    fn test_document_message() {
        let msg = message(json!({
            "message_id": 92,
            "date": 1700000100,
            "chat": staff_group(),
            "document": {"file_id": "doc", "file_unique_id": "u3", "file_name": "invoice.pdf"}
        }));

        let incoming = IncomingMessage::from_telegram(&msg);
        assert_eq!(incoming.document.as_deref(), Some("doc"));
        assert_eq!(incoming.sender_id, ChatId(-100500));
        assert_eq!(incoming.reply_to, None);
    }

    #[test]
    fn test_link_keyboard_rows() {
        let buttons = vec![
            LinkButton {
                label: "Site",
                url: "https://example.com".to_string(),
            },
            LinkButton {
                label: "VK",
                url: "https://vk.com/example".to_string(),
            },
        ];

        let markup = link_keyboard(&buttons).unwrap();
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert!(markup.inline_keyboard.iter().all(|row| row.len() == 1));
        assert_eq!(markup.inline_keyboard[1][0].text, "VK");
        assert!(matches!(
            &markup.inline_keyboard[0][0].kind,
            InlineKeyboardButtonKind::Url(url) if url.as_str() == "https://example.com/"
        ));
    }

    #[test]
    fn test_descriptions_use_legacy_markdown() {
        assert_eq!(
            serde_json::to_value(legacy_markdown()).unwrap(),
            json!("Markdown")
        );
    }

    #[test]
    fn test_stored_file_keeps_file_id() {
        let file = stored_file("AgACAgIAAxkBAAIB");
        assert_eq!(
            serde_json::to_value(&file).unwrap(),
            json!("AgACAgIAAxkBAAIB")
        );
    }

    #[test]
    fn test_link_keyboard_rejects_bad_url() {
        let buttons = vec![LinkButton {
            label: "Перейти",
            url: String::new(),
        }];
        assert!(link_keyboard(&buttons).is_err());
    }
}
