//! Persistence trait for the configuration document.

use async_trait::async_trait;

use crate::{Result, types::Document};

/// Load and save the whole document.
///
/// Implementations do no locking of their own; [`crate::ConfigStore`]
/// serializes callers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load the document. A missing document is empty, not an error.
    async fn load(&self) -> Result<Document>;

    /// Replace the stored document. Must never leave a partial write behind.
    async fn save(&self, doc: &Document) -> Result<()>;
}
