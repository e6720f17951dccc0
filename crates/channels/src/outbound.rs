use {async_trait::async_trait, std::fmt};

use crate::{Result, types::UserId};

/// Result of a best-effort send.
///
/// Sends are never retried: callers log a `Failed` outcome and move on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    Failed(String),
}

impl SendOutcome {
    #[must_use]
    pub fn failed(reason: impl fmt::Display) -> Self {
        Self::Failed(reason.to_string())
    }

    #[must_use]
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

/// How the platform should render an outgoing text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextFormat {
    #[default]
    Plain,
    /// Platform rich text; interpolated user content must go through
    /// [`crate::format::escape_html`].
    Html,
}

/// Send messages to a chat.
#[async_trait]
pub trait ChatOutbound: Send + Sync {
    async fn send_text(&self, to: i64, text: &str, format: TextFormat) -> SendOutcome;

    /// Send a photo already hosted by the platform (`photo` is its file id).
    async fn send_photo(&self, to: i64, photo: &str, caption: &str) -> SendOutcome;
}

/// Answers "is this user an administrator of this chat".
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    async fn is_admin(&self, chat_id: i64, user: UserId) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_keeps_reason() {
        let outcome = SendOutcome::failed("chat not found");
        assert_eq!(outcome, SendOutcome::Failed("chat not found".into()));
        assert!(!outcome.is_sent());
        assert!(SendOutcome::Sent.is_sent());
    }
}
