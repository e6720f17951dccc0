//! Create, complete and delete link records; tell the oversight group.

use std::{fmt, sync::Arc};

use {
    courier_channels::{ChatOutbound, ChatRef, SendOutcome, TextFormat, format::escape_html},
    courier_store::{ConfigStore, LinkRecord, QgRecord},
    tracing::{debug, info, warn},
};

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    Created,
    Deleted,
}

impl fmt::Display for LinkEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

/// Owns every write to link records.
pub struct LinkManager {
    store: Arc<ConfigStore>,
    outbound: Arc<dyn ChatOutbound>,
}

impl LinkManager {
    pub fn new(store: Arc<ConfigStore>, outbound: Arc<dyn ChatOutbound>) -> Self {
        Self { store, outbound }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Write (or overwrite) the record keyed by `request`. Idempotent.
    pub async fn create_or_update(
        &self,
        request: &ChatRef,
        collect: Option<&ChatRef>,
    ) -> Result<LinkRecord> {
        let record = match collect {
            Some(collect) => LinkRecord::complete(request, collect),
            None => LinkRecord::provisional(request),
        };
        let stored = record.clone();
        self.store.update(move |doc| doc.upsert(stored)).await?;
        debug!(
            request_id = %record.request_id,
            collect_id = ?record.collect_id,
            "link record written"
        );
        Ok(record)
    }

    /// Remove the record keyed by `chat_id`. Absent is not an error.
    pub async fn delete(&self, chat_id: i64) -> Result<Option<LinkRecord>> {
        let mut tx = self.store.transaction().await?;
        let Some(removed) = tx.doc_mut().remove(chat_id) else {
            return Ok(None);
        };
        tx.commit().await?;
        info!(chat_id, "link record deleted");
        Ok(Some(removed))
    }

    /// Claim the first incomplete record for `collect` in one transaction.
    pub async fn attach_first_incomplete(&self, collect: &ChatRef) -> Result<Option<LinkRecord>> {
        let mut tx = self.store.transaction().await?;
        let Some(record) = tx.doc_mut().attach_first_incomplete(collect) else {
            return Ok(None);
        };
        tx.commit().await?;
        Ok(Some(record))
    }

    pub async fn set_oversight(&self, chat: &ChatRef) -> Result<QgRecord> {
        let qg = QgRecord::from_chat(chat);
        let stored = qg.clone();
        self.store.update(move |doc| doc.qg = Some(stored)).await?;
        info!(chat_id = chat.id, title = %chat.title, "oversight group set");
        Ok(qg)
    }

    /// Best-effort notice to the oversight group.
    ///
    /// Returns `None` when no oversight group is configured. A failed send is
    /// logged and reported, never propagated.
    pub async fn notify_qg(&self, event: LinkEvent, record: &LinkRecord) -> Option<SendOutcome> {
        let qg = match self.store.snapshot().await {
            Ok(doc) => doc.qg?,
            Err(e) => {
                warn!(error = %e, %event, "could not read oversight group");
                return Some(SendOutcome::failed(e));
            },
        };
        let Some(chat_id) = qg.chat_id() else {
            warn!(id = %qg.id, "oversight group id is not numeric");
            return Some(SendOutcome::failed(format!("invalid oversight id {}", qg.id)));
        };

        let text = render_notice(event, record);
        let outcome = self
            .outbound
            .send_text(chat_id, &text, TextFormat::Html)
            .await;
        if let SendOutcome::Failed(reason) = &outcome {
            warn!(chat_id, %event, reason = %reason, "oversight notification failed");
        }
        Some(outcome)
    }
}

/// HTML body of an oversight notice. Titles are escaped.
#[must_use]
pub fn render_notice(event: LinkEvent, record: &LinkRecord) -> String {
    let heading = match event {
        LinkEvent::Created => "🔗 <b>New link</b>",
        LinkEvent::Deleted => "🗑 <b>Link removed</b>",
    };
    let collect = match (&record.collect_title, &record.collect_id) {
        (Some(title), Some(id)) => format!("{} (<code>{}</code>)", escape_html(title), id),
        _ => "<i>not paired</i>".to_string(),
    };
    format!(
        "{heading}\nRequest: {} (<code>{}</code>)\nCollect: {collect}",
        escape_html(&record.request_title),
        record.request_id,
    )
}
