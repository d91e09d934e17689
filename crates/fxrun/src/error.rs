//! # Error Definitions
//!
//! The central ledger of deploy and call failures.
//!
//! Each failure belongs to exactly one [`FailureClass`], which tells the driver
//! what to do next: fetch missing data, redeploy, fix the guest code, fix the
//! arguments, or retry once the store is reachable again. Nothing here is
//! retried automatically.

use fxstore::ContentId;

use crate::manifest;
use crate::sandbox;

/// Problems with the argument list supplied to a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    /// The number of argument ids differs from the manifest's declared arguments.
    CountMismatch { expected: usize, found: usize },
    /// Argument `index` could not be fetched from the store.
    NotFound { index: usize, id: ContentId },
    /// An argument (or the whole linear input) does not fit the i32 convention.
    TooLarge { index: usize, len: usize },
}

impl std::fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CountMismatch { expected, found } => {
                write!(f, "expected {} arguments, found {}", expected, found)
            }
            Self::NotFound { index, id } => write!(f, "argument {} not found: {}", index, id),
            Self::TooLarge { index, len } => {
                write!(f, "argument {} too large for the calling convention ({} bytes)", index, len)
            }
        }
    }
}

impl std::error::Error for ArgumentError {}

/// What a caller should do about a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// A manifest, bytecode, or argument blob is missing or its bytes do not
    /// match its id: fetch or re-add it.
    DataMissing,
    /// The manifest bytes are unusable: redeploy.
    MalformedManifest,
    /// The bytecode failed to load, link, or run: fix the guest code.
    CodeFaulted,
    /// The argument list is unusable: fix the arguments.
    BadArguments,
    /// The store could not be reached: retry later.
    StoreUnavailable,
    /// The caller cancelled the operation.
    Cancelled,
    /// The host could not set up the execution engine.
    Host,
}

#[derive(Debug)]
pub enum Error {
    /// No manifest blob exists under the requested id.
    ManifestNotFound(ContentId),
    /// The manifest exists but is invalid.
    Manifest(manifest::Error),
    /// The manifest names bytecode that is not in the store.
    BytecodeNotFound(ContentId),
    Argument(ArgumentError),
    Sandbox(sandbox::Error),
    /// Any store failure other than a missing blob.
    Store(fxstore::Error),
    Cancelled,
    /// The wasmtime engine could not be created.
    Engine(wasmtime::Error),
}

impl Error {
    pub fn class(&self) -> FailureClass {
        match self {
            Self::ManifestNotFound(_) | Self::BytecodeNotFound(_) => FailureClass::DataMissing,
            Self::Argument(ArgumentError::NotFound { .. }) => FailureClass::DataMissing,
            Self::Argument(_) => FailureClass::BadArguments,
            Self::Manifest(_) => FailureClass::MalformedManifest,
            Self::Sandbox(_) => FailureClass::CodeFaulted,
            Self::Store(fxstore::Error::NotFound(_) | fxstore::Error::Integrity { .. }) => FailureClass::DataMissing,
            Self::Store(_) => FailureClass::StoreUnavailable,
            Self::Cancelled => FailureClass::Cancelled,
            Self::Engine(_) => FailureClass::Host,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ManifestNotFound(id) => write!(f, "Manifest not found: {}", id),
            Self::Manifest(e) => write!(f, "Manifest error: {}", e),
            Self::BytecodeNotFound(id) => write!(f, "Bytecode not found: {}", id),
            Self::Argument(e) => write!(f, "Argument error: {}", e),
            Self::Sandbox(e) => write!(f, "Sandbox error: {}", e),
            Self::Store(e) => write!(f, "Store error: {}", e),
            Self::Cancelled => write!(f, "Call cancelled"),
            Self::Engine(e) => write!(f, "Engine error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<manifest::Error> for Error {
    fn from(e: manifest::Error) -> Self {
        Self::Manifest(e)
    }
}

impl From<ArgumentError> for Error {
    fn from(e: ArgumentError) -> Self {
        Self::Argument(e)
    }
}

impl From<sandbox::Error> for Error {
    fn from(e: sandbox::Error) -> Self {
        Self::Sandbox(e)
    }
}

impl From<fxstore::Error> for Error {
    fn from(e: fxstore::Error) -> Self {
        Self::Store(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
