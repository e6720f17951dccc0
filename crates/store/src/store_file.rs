//! JSON file-backed document store with atomic writes.

use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use {
    async_trait::async_trait,
    serde::Serialize,
    tokio::{fs, io::AsyncWriteExt},
    tracing::debug,
};

use crate::{Error, Result, backend::DocumentStore, types::Document};

/// File-backed store. The whole document lives in one JSON file.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("request_data.json"));
        name.push(suffix);
        self.path.with_file_name(name)
    }

    /// Atomic write: write and fsync a temp file, keep a `.bak` copy of the
    /// current document, then rename the temp file over the target.
    async fn atomic_write(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io("create directory", parent, e))?;
        }

        let tmp = self.sibling(".tmp");
        let mut file = fs::File::create(&tmp)
            .await
            .map_err(|e| Error::io("create", &tmp, e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| Error::io("write", &tmp, e))?;
        file.sync_all()
            .await
            .map_err(|e| Error::io("sync", &tmp, e))?;
        drop(file);

        // Copy rather than rename so the target never disappears.
        if fs::try_exists(&self.path).await.unwrap_or(false) {
            let bak = self.sibling(".bak");
            if let Err(e) = fs::copy(&self.path, &bak).await {
                debug!(path = %bak.display(), error = %e, "could not refresh backup");
            }
        }

        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| Error::io("replace", &self.path, e))
    }
}

/// Pretty JSON with a 4-space indent and a trailing newline.
pub(crate) fn render(doc: &Document) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    doc.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn load(&self) -> Result<Document> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "store missing, creating empty document");
                let doc = Document::default();
                self.save(&doc).await?;
                return Ok(doc);
            },
            Err(e) => return Err(Error::io("read", &self.path, e)),
        };

        if raw.trim().is_empty() {
            return Ok(Document::default());
        }

        serde_json::from_str(&raw).map_err(|source| Error::Parse {
            path: self.path.clone(),
            source,
        })
    }

    async fn save(&self, doc: &Document) -> Result<()> {
        let bytes = render(doc)?;
        self.atomic_write(&bytes).await?;
        debug!(path = %self.path.display(), links = doc.links.len(), "saved store");
        Ok(())
    }
}
