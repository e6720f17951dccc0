use std::fmt;

use serde::{Deserialize, Serialize};

/// A chat surface (group, supergroup or channel) with its display title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatRef {
    pub id: i64,
    pub title: String,
}

impl ChatRef {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }

    /// String form of the id, as used for durable keys.
    #[must_use]
    pub fn key(&self) -> String {
        self.id.to_string()
    }
}

/// Platform user id of whoever invoked a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
