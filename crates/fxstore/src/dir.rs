//! # Directory-backed store
//!
//! Blobs live at `<root>/<first two hex digits>/<remaining 62 hex digits>`.
//! Writes go to a temporary sibling first and are renamed into place, so a
//! reader never observes a partially written blob.

use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use crate::id::ContentId;
use crate::store::ContentStore;
use crate::Error;
use crate::Result;

/// Persistent blob store rooted at a directory.
#[derive(Debug)]
pub struct DirStore {
    root: PathBuf,
    tmp_seq: AtomicU64,
}

impl DirStore {
    /// Opens (creating if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| unreachable(&root, e))?;
        Ok(Self { root, tmp_seq: AtomicU64::new(0) })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, id: &ContentId) -> PathBuf {
        let hex = id.to_string();
        self.root.join(&hex[..2]).join(&hex[2..])
    }
}

fn unreachable(path: &Path, e: std::io::Error) -> Error {
    Error::Unreachable(format!("{}: {}", path.display(), e))
}

#[async_trait::async_trait]
impl ContentStore for DirStore {
    async fn put(&self, bytes: &[u8]) -> Result<ContentId> {
        let id = ContentId::of(bytes);
        let path = self.path_of(&id);

        if tokio::fs::try_exists(&path).await.map_err(|e| unreachable(&path, e))? {
            tracing::trace!(%id, "blob already present");
            return Ok(id);
        }

        let shard = path.parent().unwrap_or(&self.root);
        tokio::fs::create_dir_all(shard).await.map_err(|e| unreachable(shard, e))?;

        let seq = self.tmp_seq.fetch_add(1, Ordering::Relaxed);
        let tmp = shard.join(format!(".{}.{}.{}.tmp", &id.to_string()[2..14], std::process::id(), seq));
        tokio::fs::write(&tmp, bytes).await.map_err(|e| unreachable(&tmp, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(unreachable(&path, e));
        }

        tracing::debug!(%id, len = bytes.len(), "blob written");
        Ok(id)
    }

    async fn get(&self, id: &ContentId) -> Result<Vec<u8>> {
        let path = self.path_of(id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(Error::NotFound(*id)),
            Err(e) => return Err(unreachable(&path, e)),
        };

        let actual = ContentId::of(&bytes);
        if actual != *id {
            tracing::warn!(expected = %id, %actual, "blob on disk does not match its id");
            return Err(Error::Integrity { expected: *id, actual });
        }
        Ok(bytes)
    }

    async fn has(&self, id: &ContentId) -> Result<bool> {
        let path = self.path_of(id);
        tokio::fs::try_exists(&path).await.map_err(|e| unreachable(&path, e))
    }
}
