//! The pairing state machine.

use std::sync::Arc;

use {
    courier_channels::{ChatRef, SendOutcome, UserId},
    courier_store::LinkRecord,
    tracing::{debug, info},
};

use crate::{
    Result,
    lifecycle::{LinkEvent, LinkManager},
    session::{PairingSessions, PendingEntry, PendingHalf, Role},
};

/// What a pairing step did, for the adapter to turn into a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingOutcome {
    /// First half recorded; the user must run the `role.peer()` command
    /// in the other chat.
    AwaitingPeer { role: Role },
    /// Link complete and persisted.
    Completed {
        record: LinkRecord,
        notified: Option<SendOutcome>,
    },
    /// Both halves point at the same chat; the pending half is kept.
    SameChat,
    /// A pending entry was found but was not authorized; it is discarded.
    Dropped,
    /// Auto-claim found no incomplete record.
    NothingToClaim,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlinkOutcome {
    Removed {
        record: LinkRecord,
        notified: Option<SendOutcome>,
    },
    NotConfigured,
}

/// Resolves the two halves of a link.
///
/// Authorization is checked by the caller before any method here runs.
pub struct PairingCoordinator {
    sessions: Arc<dyn PairingSessions>,
    links: Arc<LinkManager>,
}

impl PairingCoordinator {
    pub fn new(sessions: Arc<dyn PairingSessions>, links: Arc<LinkManager>) -> Self {
        Self { sessions, links }
    }

    #[must_use]
    pub fn links(&self) -> &Arc<LinkManager> {
        &self.links
    }

    /// Run from the chat whose tagged messages should be collected.
    pub async fn begin_as_request(&self, user: UserId, chat: ChatRef) -> Result<PairingOutcome> {
        self.begin(user, PendingHalf::Request(chat)).await
    }

    /// Run from the chat that should receive the collected messages.
    pub async fn begin_as_collector(&self, user: UserId, chat: ChatRef) -> Result<PairingOutcome> {
        self.begin(user, PendingHalf::Collect(chat)).await
    }

    async fn begin(&self, user: UserId, own: PendingHalf) -> Result<PairingOutcome> {
        let role = own.role();

        if let Some(pending) = self.sessions.take(user) {
            let pair = match (&pending.half, &own) {
                (PendingHalf::Request(request), PendingHalf::Collect(collect))
                | (PendingHalf::Collect(collect), PendingHalf::Request(request)) => {
                    Some((request.clone(), collect.clone()))
                },
                _ => None,
            };
            match pair {
                Some((request, collect)) => {
                    return self.complete(user, pending, request, collect).await;
                },
                None => debug!(%user, ?role, "replacing pending half of the same role"),
            }
        }

        // Provisional record; a channel may claim it before the peer arrives.
        if let PendingHalf::Request(chat) = &own {
            self.links.create_or_update(chat, None).await?;
        }
        debug!(%user, ?role, chat_id = own.chat().id, "pairing started");
        self.sessions.put(user, PendingEntry::authorized(own));
        Ok(PairingOutcome::AwaitingPeer { role })
    }

    async fn complete(
        &self,
        user: UserId,
        pending: PendingEntry,
        request: ChatRef,
        collect: ChatRef,
    ) -> Result<PairingOutcome> {
        if !pending.authorized {
            debug!(%user, "discarding unauthorized pending entry");
            return Ok(PairingOutcome::Dropped);
        }
        if request.id == collect.id {
            self.sessions.put(user, pending);
            return Ok(PairingOutcome::SameChat);
        }

        let record = match self.links.create_or_update(&request, Some(&collect)).await {
            Ok(record) => record,
            Err(e) => {
                // Restore the half so a retry of the second command completes.
                self.sessions.put(user, pending);
                return Err(e);
            },
        };
        info!(
            %user,
            request_id = %record.request_id,
            collect_id = ?record.collect_id,
            "link completed"
        );
        let notified = self.links.notify_qg(LinkEvent::Created, &record).await;
        Ok(PairingOutcome::Completed { record, notified })
    }

    /// Collector entry point for broadcast channels, which cannot carry
    /// commands or identify the posting admin.
    ///
    /// Attaches the channel to the first incomplete record in store order.
    /// With several incomplete records the choice is not identity-verified.
    pub async fn auto_claim(&self, chat: ChatRef) -> Result<PairingOutcome> {
        let Some(record) = self.links.attach_first_incomplete(&chat).await? else {
            debug!(chat_id = chat.id, "auto-claim found no incomplete link");
            return Ok(PairingOutcome::NothingToClaim);
        };
        info!(
            request_id = %record.request_id,
            collect_id = chat.id,
            "link auto-claimed by channel"
        );
        let notified = self.links.notify_qg(LinkEvent::Created, &record).await;
        Ok(PairingOutcome::Completed { record, notified })
    }

    /// Remove the link keyed by `chat_id` and notify on success.
    pub async fn unlink(&self, chat_id: i64) -> Result<UnlinkOutcome> {
        let Some(record) = self.links.delete(chat_id).await? else {
            return Ok(UnlinkOutcome::NotConfigured);
        };
        let notified = self.links.notify_qg(LinkEvent::Deleted, &record).await;
        Ok(UnlinkOutcome::Removed { record, notified })
    }
}
