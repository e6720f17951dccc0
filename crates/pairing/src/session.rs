//! In-memory pending pairings, keyed by the admin who started them.
//!
//! Entries are transient: they are lost on restart and expire after a TTL.

use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use courier_channels::{ChatRef, UserId};

/// How long a first half waits for its peer.
pub const DEFAULT_PAIRING_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Request,
    Collect,
}

impl Role {
    #[must_use]
    pub fn peer(self) -> Self {
        match self {
            Self::Request => Self::Collect,
            Self::Collect => Self::Request,
        }
    }
}

/// The half of a link that is already known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingHalf {
    Request(ChatRef),
    Collect(ChatRef),
}

impl PendingHalf {
    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            Self::Request(_) => Role::Request,
            Self::Collect(_) => Role::Collect,
        }
    }

    #[must_use]
    pub fn chat(&self) -> &ChatRef {
        match self {
            Self::Request(chat) | Self::Collect(chat) => chat,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry {
    pub half: PendingHalf,
    pub authorized: bool,
    pub created_at: Instant,
}

impl PendingEntry {
    #[must_use]
    pub fn authorized(half: PendingHalf) -> Self {
        Self {
            half,
            authorized: true,
            created_at: Instant::now(),
        }
    }
}

/// Storage for pending pairings.
///
/// `take` is read-once: a returned entry is gone from the store.
pub trait PairingSessions: Send + Sync {
    /// Insert or replace the entry for `user`.
    fn put(&self, user: UserId, entry: PendingEntry);

    /// Remove and return the live entry for `user`, if any.
    fn take(&self, user: UserId) -> Option<PendingEntry>;

    /// Live entries currently held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local sessions with lazy TTL eviction.
///
/// The mutex is never held across an `.await`.
pub struct MemorySessions {
    entries: Mutex<HashMap<UserId, PendingEntry>>,
    ttl: Duration,
}

impl MemorySessions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn is_live(&self, entry: &PendingEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.created_at) < self.ttl
    }

    /// Drop expired entries.
    pub fn evict_expired(&self) {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, entry| self.is_live(entry, now));
    }
}

impl Default for MemorySessions {
    fn default() -> Self {
        Self::new(DEFAULT_PAIRING_TTL)
    }
}

impl PairingSessions for MemorySessions {
    fn put(&self, user: UserId, entry: PendingEntry) {
        self.evict_expired();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(user, entry);
    }

    fn take(&self, user: UserId) -> Option<PendingEntry> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let entry = entries.remove(&user)?;
        self.is_live(&entry, Instant::now()).then_some(entry)
    }

    fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.values().filter(|e| self.is_live(e, now)).count()
    }
}
