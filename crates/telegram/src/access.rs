use {
    async_trait::async_trait,
    teloxide::{prelude::*, types::ChatId},
    tracing::debug,
};

use courier_channels::{AdminDirectory, Error, Result, UserId};

/// Admin lookups through `getChatAdministrators`. Results are not cached.
#[derive(Clone)]
pub struct TelegramAdmins {
    bot: Bot,
}

impl TelegramAdmins {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl AdminDirectory for TelegramAdmins {
    async fn is_admin(&self, chat_id: i64, user: UserId) -> Result<bool> {
        let members = self
            .bot
            .get_chat_administrators(ChatId(chat_id))
            .await
            .map_err(|e| Error::external("get chat administrators", e))?;
        let found = members.iter().any(|m| m.user.id.0 == user.0);
        debug!(chat_id, user_id = %user, admin_count = members.len(), found, "admin lookup");
        Ok(found)
    }
}

/// Why a message may not run a privileged command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    /// The sender is not an administrator of the chat.
    NotAdmin,
    /// Links and oversight only exist for groups and channels.
    PrivateChat,
    /// The sender cannot be identified.
    UnknownSender,
}

impl std::fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAdmin => write!(f, "sender is not a chat administrator"),
            Self::PrivateChat => write!(f, "command used in a private chat"),
            Self::UnknownSender => write!(f, "sender unknown"),
        }
    }
}
