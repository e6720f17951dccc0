use std::sync::Arc;

use {
    courier_channels::{ChatOutbound, SendOutcome, TextFormat},
    courier_store::ConfigStore,
    tracing::{debug, info, warn},
};

use crate::{
    Result,
    tag::{TagMarker, format_request},
};

/// A platform message reduced to what the relay looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat_id: i64,
    /// Display attribution of whoever posted the message.
    pub sender: String,
    pub text: Option<String>,
    pub caption: Option<String>,
    /// Platform file id of the largest photo size.
    pub photo: Option<String>,
}

impl InboundMessage {
    /// Body text, or the caption when the message is a photo.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        if self.photo.is_some() {
            self.caption.as_deref()
        } else {
            self.text.as_deref()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotLinked,
    Incomplete,
    NoText,
    Untagged,
    EmptyBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Ignored(IgnoreReason),
    Forwarded { to: i64, outcome: SendOutcome },
}

pub struct RequestRelay {
    store: Arc<ConfigStore>,
    outbound: Arc<dyn ChatOutbound>,
    tag: TagMarker,
}

impl RequestRelay {
    pub fn new(store: Arc<ConfigStore>, outbound: Arc<dyn ChatOutbound>, tag: TagMarker) -> Self {
        Self {
            store,
            outbound,
            tag,
        }
    }

    /// Inspect one inbound message and forward it if it is a tagged request
    /// from a linked chat. Send failures are logged and returned, never
    /// retried.
    pub async fn handle(&self, msg: &InboundMessage) -> Result<RelayOutcome> {
        let doc = self.store.snapshot().await?;
        let Some(record) = doc.link(msg.chat_id) else {
            return Ok(RelayOutcome::Ignored(IgnoreReason::NotLinked));
        };
        let Some(to) = record.collect_chat_id() else {
            debug!(chat_id = msg.chat_id, "link incomplete, not relaying");
            return Ok(RelayOutcome::Ignored(IgnoreReason::Incomplete));
        };
        let Some(content) = msg.content() else {
            return Ok(RelayOutcome::Ignored(IgnoreReason::NoText));
        };
        let Some(body) = self.tag.strip(content) else {
            return Ok(RelayOutcome::Ignored(IgnoreReason::Untagged));
        };
        if body.is_empty() {
            return Ok(RelayOutcome::Ignored(IgnoreReason::EmptyBody));
        }

        let text = format_request(&msg.sender, &record.request_title, &body);
        let outcome = match &msg.photo {
            Some(photo) => self.outbound.send_photo(to, photo, &text).await,
            None => self.outbound.send_text(to, &text, TextFormat::Plain).await,
        };
        match &outcome {
            SendOutcome::Sent => info!(
                from = msg.chat_id,
                to,
                photo = msg.photo.is_some(),
                "request relayed"
            ),
            SendOutcome::Failed(reason) => warn!(
                from = msg.chat_id,
                to,
                reason = %reason,
                "request relay failed"
            ),
        }
        Ok(RelayOutcome::Forwarded { to, outcome })
    }
}
