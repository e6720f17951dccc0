use {
    async_trait::async_trait,
    teloxide::{
        payloads::{SendMessageSetters, SendPhotoSetters},
        prelude::*,
        types::{ChatId, InputFile, ParseMode},
    },
    tracing::{debug, warn},
};

use courier_channels::{ChatOutbound, SendOutcome, TextFormat};

/// Outbound message sender for Telegram.
///
/// Every send is attempted once; failures come back as
/// [`SendOutcome::Failed`].
#[derive(Clone)]
pub struct TelegramOutbound {
    bot: Bot,
}

impl TelegramOutbound {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatOutbound for TelegramOutbound {
    async fn send_text(&self, to: i64, text: &str, format: TextFormat) -> SendOutcome {
        let mut req = self.bot.send_message(ChatId(to), text);
        if format == TextFormat::Html {
            req = req.parse_mode(ParseMode::Html);
        }
        match req.await {
            Ok(_) => {
                debug!(chat_id = to, text_len = text.len(), ?format, "telegram text sent");
                SendOutcome::Sent
            },
            Err(e) => {
                warn!(chat_id = to, error = %e, "telegram text send failed");
                SendOutcome::failed(e)
            },
        }
    }

    async fn send_photo(&self, to: i64, photo: &str, caption: &str) -> SendOutcome {
        let mut req = self
            .bot
            .send_photo(ChatId(to), InputFile::file_id(photo.to_string()));
        if !caption.is_empty() {
            req = req.caption(caption);
        }
        match req.await {
            Ok(_) => {
                debug!(chat_id = to, caption_len = caption.len(), "telegram photo sent");
                SendOutcome::Sent
            },
            Err(e) => {
                warn!(chat_id = to, error = %e, "telegram photo send failed");
                SendOutcome::failed(e)
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::mock_api::{Captured, MockTelegramApi},
    };

    #[tokio::test]
    async fn html_text_sets_parse_mode() {
        let api = MockTelegramApi::start().await;
        let outbound = TelegramOutbound::new(api.bot());

        let outcome = outbound
            .send_text(-100, "<b>hi</b>", TextFormat::Html)
            .await;
        assert_eq!(outcome, SendOutcome::Sent);

        let requests = api.requests();
        assert!(
            requests.iter().any(|r| matches!(r,
                Captured::SendMessage(m)
                    if m.chat_id == -100
                        && m.text == "<b>hi</b>"
                        && m.parse_mode.as_deref() == Some("HTML"))),
            "requests={requests:?}"
        );
        api.shutdown().await;
    }

    #[tokio::test]
    async fn plain_text_has_no_parse_mode() {
        let api = MockTelegramApi::start().await;
        let outbound = TelegramOutbound::new(api.bot());

        let outcome = outbound
            .send_text(7, "📬 a <b> & c", TextFormat::Plain)
            .await;
        assert!(outcome.is_sent());

        let requests = api.requests();
        assert!(
            requests.iter().any(|r| matches!(r,
                Captured::SendMessage(m) if m.chat_id == 7 && m.parse_mode.is_none())),
            "requests={requests:?}"
        );
        api.shutdown().await;
    }

    #[tokio::test]
    async fn photo_resends_file_id_with_caption() {
        let api = MockTelegramApi::start().await;
        let outbound = TelegramOutbound::new(api.bot());

        let outcome = outbound.send_photo(9, "photo-file-id", "📬 caption").await;
        assert!(outcome.is_sent());

        let requests = api.requests();
        assert!(
            requests.iter().any(|r| matches!(r,
                Captured::Other { method, raw_body }
                    if method == "SendPhoto"
                        && raw_body.contains("photo-file-id")
                        && raw_body.contains("📬 caption"))),
            "requests={requests:?}"
        );
        api.shutdown().await;
    }

    #[tokio::test]
    async fn api_error_becomes_failed_outcome() {
        let api = MockTelegramApi::start().await;
        api.fail_sends();
        let outbound = TelegramOutbound::new(api.bot());

        let outcome = outbound.send_text(5, "hello", TextFormat::Plain).await;
        assert!(matches!(outcome, SendOutcome::Failed(reason) if !reason.is_empty()));
        api.shutdown().await;
    }
}
