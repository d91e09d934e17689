//! # fxstore
//!
//! Content-addressed blob storage.
//!
//! Every blob is identified by the SHA-256 digest of its bytes. Equal content
//! always yields an equal [`ContentId`], so `put` is idempotent and a blob can
//! never be replaced by different content under the same id.
//!
//! Two stores ship with the crate:
//!
//! - [`MemoryStore`]: concurrent in-process map, used by tests and embedders.
//! - [`DirStore`]: persistent, one file per blob under a sharded directory tree.
//!
//! Anything else (a network block exchange, a cache in front of a peer) plugs in
//! by implementing [`ContentStore`].

pub mod dir;
pub mod id;
pub mod memory;
pub mod store;

pub use dir::DirStore;
pub use id::ContentId;
pub use id::ParseIdError;
pub use memory::MemoryStore;
pub use store::ContentStore;


/// Failures surfaced by a content store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No blob with this id is available.
    NotFound(ContentId),
    /// The backing medium (disk, peer, network) could not be reached.
    Unreachable(String),
    /// The bytes read back do not hash to the requested id.
    Integrity { expected: ContentId, actual: ContentId },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "Blob not found: {}", id),
            Self::Unreachable(msg) => write!(f, "Store unreachable: {}", msg),
            Self::Integrity { expected, actual } => {
                write!(f, "Integrity failure: expected {}, read {}", expected, actual)
            }
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
