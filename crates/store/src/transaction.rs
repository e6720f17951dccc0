//! Serialized load-mutate-save over a [`DocumentStore`].

use std::{path::PathBuf, sync::Arc};

use tokio::sync::{Mutex, MutexGuard};

use crate::{
    Result, backend::DocumentStore, store_file::FileStore, store_memory::MemoryStore,
    types::Document,
};

/// The single source of truth for link configuration.
///
/// Every mutation goes through a [`Transaction`]: acquire the lock, load the
/// whole document, mutate, save the whole document, release. Readers use
/// [`ConfigStore::snapshot`] under the same lock so they never observe a
/// half-written file.
pub struct ConfigStore {
    backend: Arc<dyn DocumentStore>,
    lock: Mutex<()>,
}

impl ConfigStore {
    pub fn new(backend: Arc<dyn DocumentStore>) -> Self {
        Self {
            backend,
            lock: Mutex::new(()),
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStore::new(path)))
    }

    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub async fn transaction(&self) -> Result<Transaction<'_>> {
        let guard = self.lock.lock().await;
        let doc = self.backend.load().await?;
        Ok(Transaction {
            _guard: guard,
            backend: self.backend.as_ref(),
            doc,
        })
    }

    pub async fn snapshot(&self) -> Result<Document> {
        let _guard = self.lock.lock().await;
        self.backend.load().await
    }

    /// Run `mutate` inside a transaction and commit.
    pub async fn update<R>(&self, mutate: impl FnOnce(&mut Document) -> R) -> Result<R> {
        let mut tx = self.transaction().await?;
        let out = mutate(tx.doc_mut());
        tx.commit().await?;
        Ok(out)
    }
}

/// A locked, loaded document. Dropping it without [`Transaction::commit`]
/// discards every change.
pub struct Transaction<'a> {
    _guard: MutexGuard<'a, ()>,
    backend: &'a dyn DocumentStore,
    doc: Document,
}

impl Transaction<'_> {
    #[must_use]
    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Persist the document and release the lock.
    pub async fn commit(self) -> Result<()> {
        self.backend.save(&self.doc).await
    }
}
