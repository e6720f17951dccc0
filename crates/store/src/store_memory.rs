//! In-memory document store for tests and dry runs.

use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;

use crate::{Result, backend::DocumentStore, types::Document};

#[derive(Default)]
pub struct MemoryStore {
    doc: Mutex<Document>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(doc: Document) -> Self {
        Self {
            doc: Mutex::new(doc),
            saves: AtomicUsize::new(0),
        }
    }

    /// How many times `save` has been called.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load(&self) -> Result<Document> {
        let doc = self.doc.lock().unwrap_or_else(|e| e.into_inner());
        Ok(doc.clone())
    }

    async fn save(&self, doc: &Document) -> Result<()> {
        *self.doc.lock().unwrap_or_else(|e| e.into_inner()) = doc.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
