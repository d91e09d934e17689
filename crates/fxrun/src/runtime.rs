//! # Runtime
//!
//! The handle through which functions are deployed and called. A `Runtime`
//! owns the wasmtime engine, the module cache, and a reference to the content
//! store. It is cheap to clone; clones share everything.
//!
//! The runtime keeps no per-call state between calls. Counters are atomics so
//! concurrent callers never contend on a lock.
//!
//! Guest code is preempted with epoch interruption: a background thread bumps
//! the engine epoch every [`Config::epoch_tick`], and every store yields back
//! to the executor at each new epoch. A call racing a cancel signal therefore
//! observes the signal even while the guest is spinning. The ticker exits once
//! the last clone of the runtime is dropped.

use std::sync::Arc;
use std::sync::Weak;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use fxstore::ContentId;
use fxstore::ContentStore;
use wasmtime::Engine;

use crate::config::Config;
use crate::error::Error;
use crate::error::Result;
use crate::manifest::FunctionManifest;
use crate::sandbox::Sandbox;

/// Point-in-time counters for a runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub deploys: u64,
    pub calls: u64,
    pub failed_calls: u64,
    pub instantiations: u64,
    pub cached_modules: usize,
}

#[derive(Clone)]
pub struct Runtime {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn ContentStore>,
    sandbox: Sandbox,
    config: Config,
    deploys: AtomicU64,
    calls: AtomicU64,
    failed_calls: AtomicU64,
}

impl Runtime {
    /// Creates a runtime over `store` with the standard configuration.
    pub fn new(store: Arc<dyn ContentStore>) -> Result<Self> {
        Self::with_config(store, Config::standard())
    }

    pub fn with_config(store: Arc<dyn ContentStore>, config: Config) -> Result<Self> {
        let mut engine_config = wasmtime::Config::new();
        engine_config.async_support(true).epoch_interruption(true);

        let engine = Engine::new(&engine_config).map_err(Error::Engine)?;
        Ok(Self::with_engine(store, engine, config))
    }

    /// Creates a runtime on a caller-built engine.
    ///
    /// The engine must have async support enabled. Without epoch interruption
    /// a spinning guest cannot be cancelled.
    pub fn with_engine(store: Arc<dyn ContentStore>, engine: Engine, config: Config) -> Self {
        let sandbox = Sandbox::new(engine, config.get_cache_capacity());
        let tick = config.get_epoch_tick();
        let inner = Arc::new(Inner {
            store,
            sandbox,
            config,
            deploys: AtomicU64::new(0),
            calls: AtomicU64::new(0),
            failed_calls: AtomicU64::new(0),
        });
        spawn_epoch_ticker(Arc::downgrade(&inner), tick);
        Self { inner }
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.inner.store
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn engine(&self) -> &Engine {
        self.inner.sandbox.engine()
    }

    pub(crate) fn sandbox(&self) -> &Sandbox {
        &self.inner.sandbox
    }

    pub fn stats(&self) -> Stats {
        Stats {
            deploys: self.inner.deploys.load(Ordering::Relaxed),
            calls: self.inner.calls.load(Ordering::Relaxed),
            failed_calls: self.inner.failed_calls.load(Ordering::Relaxed),
            instantiations: self.inner.sandbox.instantiations(),
            cached_modules: self.inner.sandbox.cached_modules(),
        }
    }

    pub(crate) fn record_deploy(&self) {
        self.inner.deploys.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_call(&self, ok: bool) {
        let counter = if ok { &self.inner.calls } else { &self.inner.failed_calls };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Fetches and decodes the manifest stored under `id`.
    pub async fn manifest(&self, id: &ContentId) -> Result<FunctionManifest> {
        let bytes = match self.store().get(id).await {
            Ok(bytes) => bytes,
            Err(fxstore::Error::NotFound(_)) => return Err(Error::ManifestNotFound(*id)),
            Err(e) => return Err(e.into()),
        };
        Ok(FunctionManifest::decode(&bytes)?)
    }
}

fn spawn_epoch_ticker(inner: Weak<Inner>, tick: Duration) {
    let spawned = std::thread::Builder::new()
        .name("fxrun-epoch".into())
        .spawn(move || {
            loop {
                std::thread::sleep(tick);
                match inner.upgrade() {
                    Some(inner) => inner.sandbox.engine().increment_epoch(),
                    None => break,
                }
            }
            tracing::trace!("epoch ticker stopped");
        });
    if let Err(e) = spawned {
        tracing::warn!(error = %e, "failed to start epoch ticker; running guests cannot be cancelled");
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.inner.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
