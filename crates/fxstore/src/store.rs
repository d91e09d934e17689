//! # Store Abstraction
//!
//! A minimal async interface for putting and getting immutable blobs.
//!
//! The store knows nothing about manifests, bytecode, or arguments; it moves
//! opaque byte buffers keyed by their hash.

use std::sync::Arc;

use crate::id::ContentId;
use crate::Error;
use crate::Result;

/// A content-addressed blob store.
///
/// This trait is object-safe (`Arc<dyn ContentStore>`).
///
/// # Invariants
/// - `put` is deterministic and idempotent: the returned id is `ContentId::of(bytes)`
///   and storing the same bytes twice keeps a single copy.
/// - `get` returns exactly the bytes that were put, or `Error::NotFound`.
/// - Implementations may block on network I/O; they impose no timeout of their own.
#[async_trait::async_trait]
pub trait ContentStore: Send + Sync + 'static {
    /// Stores `bytes` and returns their id.
    async fn put(&self, bytes: &[u8]) -> Result<ContentId>;

    /// Fetches the blob named by `id`.
    async fn get(&self, id: &ContentId) -> Result<Vec<u8>>;

    /// Returns whether the blob is available.
    async fn has(&self, id: &ContentId) -> Result<bool> {
        match self.get(id).await {
            Ok(_) => Ok(true),
            Err(Error::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[async_trait::async_trait]
impl<S: ContentStore + ?Sized> ContentStore for Arc<S> {
    async fn put(&self, bytes: &[u8]) -> Result<ContentId> {
        (**self).put(bytes).await
    }

    async fn get(&self, id: &ContentId) -> Result<Vec<u8>> {
        (**self).get(id).await
    }

    async fn has(&self, id: &ContentId) -> Result<bool> {
        (**self).has(id).await
    }
}
