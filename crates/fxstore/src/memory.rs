//! In-process store backed by a concurrent map.

use std::sync::Arc;

use dashmap::DashMap;

use crate::id::ContentId;
use crate::store::ContentStore;
use crate::Error;
use crate::Result;

/// Concurrent in-memory blob store.
///
/// Cloning shares the underlying map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    blobs: Arc<DashMap<ContentId, Arc<[u8]>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct blobs held.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn contains(&self, id: &ContentId) -> bool {
        self.blobs.contains_key(id)
    }
}

#[async_trait::async_trait]
impl ContentStore for MemoryStore {
    async fn put(&self, bytes: &[u8]) -> Result<ContentId> {
        let id = ContentId::of(bytes);
        self.blobs.entry(id).or_insert_with(|| Arc::from(bytes));
        Ok(id)
    }

    async fn get(&self, id: &ContentId) -> Result<Vec<u8>> {
        self.blobs
            .get(id)
            .map(|entry| entry.value().to_vec())
            .ok_or(Error::NotFound(*id))
    }

    async fn has(&self, id: &ContentId) -> Result<bool> {
        Ok(self.contains(id))
    }
}
