//! # fxrun
//!
//! Deploy and call content-addressed functions.
//!
//! A function is a WebAssembly core module plus a manifest. [`Runtime::deploy`]
//! stores both and returns the manifest's [`ContentId`], which is the function's
//! permanent address. [`Runtime::call`] resolves that address, fetches argument
//! blobs by id, runs the entrypoint in a fresh sandbox, and stores the output,
//! returning its id.
//!
//! ```rust,no_run
//! # async fn demo(wasm: &[u8]) -> fxrun::Result<()> {
//! use std::sync::Arc;
//! use fxrun::Runtime;
//! use fxstore::{ContentStore, MemoryStore};
//!
//! let store = Arc::new(MemoryStore::new());
//! let runtime = Runtime::new(store.clone())?;
//!
//! let fx = runtime.deploy(wasm, ["fx"], [fxrun::TypeDescriptor::new("string")]).await?;
//! let arg = store.put(b"Hello World!").await?;
//! let out = runtime.call(&fx, "fx", &[arg]).await?;
//! assert_eq!(store.get(&out).await?, b"Hello World!");
//! # Ok(())
//! # }
//! ```

pub mod call;
pub mod config;
pub mod convention;
pub mod deploy;
pub mod error;
pub mod manifest;
pub mod memory;
pub mod runtime;
pub mod sandbox;

pub use config::Config;
pub use error::ArgumentError;
pub use error::Error;
pub use error::FailureClass;
pub use error::Result;
pub use manifest::FunctionManifest;
pub use manifest::TypeDescriptor;
pub use runtime::Runtime;
pub use runtime::Stats;

pub use fxstore::ContentId;
pub use fxstore::ContentStore;
