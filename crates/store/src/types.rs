//! Document and record types, serialized exactly as stored.

use std::collections::BTreeMap;

use {
    courier_channels::ChatRef,
    serde::{Deserialize, Deserializer, Serialize},
};

/// Top-level key of the oversight record.
pub const QG_KEY: &str = "qg_group";

/// One request chat and, once paired, the collection chat it feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    #[serde(deserialize_with = "id_string")]
    pub request_id: String,
    pub request_title: String,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub collect_id: Option<String>,
    #[serde(default)]
    pub collect_title: Option<String>,
}

impl LinkRecord {
    /// Request half only; not yet routable.
    #[must_use]
    pub fn provisional(request: &ChatRef) -> Self {
        Self {
            request_id: request.key(),
            request_title: request.title.clone(),
            collect_id: None,
            collect_title: None,
        }
    }

    #[must_use]
    pub fn complete(request: &ChatRef, collect: &ChatRef) -> Self {
        let mut record = Self::provisional(request);
        record.attach(collect);
        record
    }

    pub fn attach(&mut self, collect: &ChatRef) {
        self.collect_id = Some(collect.key());
        self.collect_title = Some(collect.title.clone());
    }

    /// Only complete records participate in relay.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.collect_id.is_some()
    }

    /// Numeric destination id, if paired and well-formed.
    #[must_use]
    pub fn collect_chat_id(&self) -> Option<i64> {
        self.collect_id.as_deref().and_then(|id| id.parse().ok())
    }
}

/// The oversight group notified about link changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QgRecord {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub title: String,
}

impl QgRecord {
    #[must_use]
    pub fn from_chat(chat: &ChatRef) -> Self {
        Self {
            id: chat.key(),
            title: chat.title.clone(),
        }
    }

    #[must_use]
    pub fn chat_id(&self) -> Option<i64> {
        self.id.parse().ok()
    }
}

/// The whole persisted mapping: `"qg_group"` plus one entry per request chat.
///
/// Links live in a `BTreeMap` so the same content always serializes to the
/// same bytes and iteration order is the sorted key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "qg_group", default, skip_serializing_if = "Option::is_none")]
    pub qg: Option<QgRecord>,
    #[serde(flatten)]
    pub links: BTreeMap<String, LinkRecord>,
}

impl Document {
    #[must_use]
    pub fn link(&self, chat_id: i64) -> Option<&LinkRecord> {
        self.links.get(&chat_id.to_string())
    }

    /// Insert or overwrite, keyed by the record's request id.
    pub fn upsert(&mut self, record: LinkRecord) {
        self.links.insert(record.request_id.clone(), record);
    }

    pub fn remove(&mut self, chat_id: i64) -> Option<LinkRecord> {
        self.links.remove(&chat_id.to_string())
    }

    /// Incomplete records in store iteration order.
    pub fn incomplete(&self) -> impl Iterator<Item = &LinkRecord> {
        self.links.values().filter(|r| !r.is_complete())
    }

    /// Attach `collect` to the first incomplete record, returning a copy of it.
    ///
    /// A record whose request chat is `collect` itself is never claimed.
    pub fn attach_first_incomplete(&mut self, collect: &ChatRef) -> Option<LinkRecord> {
        let key = collect.key();
        let record = self
            .links
            .values_mut()
            .find(|r| !r.is_complete() && r.request_id != key)?;
        record.attach(collect);
        Some(record.clone())
    }
}

/// Accept both `"123"` and `123`; older documents wrote the oversight
/// group id as a raw integer.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn opt_id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}
