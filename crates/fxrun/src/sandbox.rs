//! # Sandbox
//!
//! Thin layer over wasmtime that loads a core module, instantiates it with an
//! empty import set, and exposes the three exports the calling convention
//! needs: a linear memory, an allocator, and an entrypoint.
//!
//! Compiled modules may be cached by bytecode id. Compiled code is immutable,
//! so the cache never changes what a call observes: every [`Session`] owns a
//! fresh `Store` and instance, and nothing mutable outlives it. The cache holds
//! at most `capacity` modules; inserting past that evicts an arbitrary entry.
//!
//! Every store yields to the executor at each epoch tick, so a running guest
//! can be dropped mid-call.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use dashmap::DashMap;
use fxstore::ContentId;
use wasmtime::Engine;
use wasmtime::Func;
use wasmtime::FuncType;
use wasmtime::Instance;
use wasmtime::Module;
use wasmtime::Store;
use wasmtime::TypedFunc;
use wasmtime::Val;
use wasmtime::ValType;

use crate::memory::GuestMemory;
use crate::memory::OutOfBounds;

#[derive(Debug)]
pub enum Error {
    /// The bytecode is not a loadable module.
    Load(wasmtime::Error),
    /// The module could not be instantiated (it has imports, or its start function trapped).
    Instantiation(wasmtime::Error),
    /// A required export is absent.
    ExportNotFound(String),
    /// An export exists but has the wrong type.
    SignatureMismatch { export: String, expected: String, found: String },
    /// Guest code trapped while running.
    Trap(wasmtime::Error),
    /// A guest memory access fell outside the memory.
    OutOfBounds(OutOfBounds),
    /// The entrypoint returned a negative output length.
    InvalidResultLength(i32),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load(e) => write!(f, "Module load error: {}", e),
            Self::Instantiation(e) => write!(f, "Instantiation error: {}", e),
            Self::ExportNotFound(name) => write!(f, "Export not found: '{}'", name),
            Self::SignatureMismatch { export, expected, found } => {
                write!(f, "Export '{}' has type {}, expected {}", export, found, expected)
            }
            Self::Trap(e) => write!(f, "Execution error: {}", e),
            Self::OutOfBounds(e) => write!(f, "Memory error: {}", e),
            Self::InvalidResultLength(b) => write!(f, "Entrypoint returned negative length {}", b),
        }
    }
}

impl std::error::Error for Error {}

impl From<OutOfBounds> for Error {
    fn from(e: OutOfBounds) -> Self {
        Self::OutOfBounds(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Loads modules and opens per-call sessions.
pub struct Sandbox {
    engine: Engine,
    modules: Option<DashMap<ContentId, Module>>,
    capacity: usize,
    instantiations: AtomicU64,
}

impl Sandbox {
    /// A `capacity` of zero disables the module cache.
    pub fn new(engine: Engine, capacity: usize) -> Self {
        Self {
            engine,
            modules: (capacity > 0).then(DashMap::new),
            capacity,
            instantiations: AtomicU64::new(0),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Compiles `bytes`, reusing a cached compilation for the same `id`.
    pub fn load(&self, id: ContentId, bytes: &[u8]) -> Result<Module> {
        if let Some(module) = self.modules.as_ref().and_then(|m| m.get(&id)) {
            tracing::trace!(%id, "module cache hit");
            return Ok(module.value().clone());
        }

        let module = Module::new(&self.engine, bytes).map_err(Error::Load)?;
        if let Some(modules) = &self.modules {
            while modules.len() >= self.capacity {
                // The iterator guard must be released before removing.
                let Some(victim) = modules.iter().next().map(|entry| *entry.key()) else {
                    break;
                };
                modules.remove(&victim);
                tracing::trace!(%victim, "module evicted");
            }
            modules.insert(id, module.clone());
        }
        Ok(module)
    }

    /// Number of compiled modules currently cached.
    pub fn cached_modules(&self) -> usize {
        self.modules.as_ref().map_or(0, DashMap::len)
    }

    /// Instantiates `module` into a fresh store with no imports.
    pub async fn instantiate(&self, module: &Module) -> Result<Session> {
        self.instantiations.fetch_add(1, Ordering::Relaxed);
        let mut store = Store::new(&self.engine, ());
        store.set_epoch_deadline(1);
        store.epoch_deadline_async_yield_and_update(1);
        let instance = Instance::new_async(&mut store, module, &[])
            .await
            .map_err(Error::Instantiation)?;
        Ok(Session { store, instance })
    }

    /// Total number of instantiation attempts.
    pub fn instantiations(&self) -> u64 {
        self.instantiations.load(Ordering::Relaxed)
    }
}

/// One live instance, owned by exactly one call.
pub struct Session {
    store: Store<()>,
    instance: Instance,
}

impl Session {
    /// Resolves the exported linear memory.
    pub fn memory(&mut self, name: &str) -> Result<GuestMemory> {
        self.instance
            .get_memory(&mut self.store, name)
            .map(GuestMemory::new)
            .ok_or_else(|| Error::ExportNotFound(name.to_string()))
    }

    /// Resolves the allocator, which must be `(i32) -> i32`.
    pub fn allocator(&mut self, name: &str) -> Result<TypedFunc<i32, i32>> {
        let func = self.func(name)?;
        func.typed::<i32, i32>(&self.store).map_err(|_| Error::SignatureMismatch {
            export: name.to_string(),
            expected: describe(1),
            found: describe_type(&func.ty(&self.store)),
        })
    }

    /// Resolves an entrypoint taking `arity` i32 parameters and returning one i32.
    pub fn entrypoint(&mut self, name: &str, arity: usize) -> Result<Func> {
        let func = self.func(name)?;
        let ty = func.ty(&self.store);

        let params_ok = ty.params().len() == arity && ty.params().all(|p| matches!(p, ValType::I32));
        let mut results = ty.results();
        let results_ok = results.len() == 1 && matches!(results.next(), Some(ValType::I32));

        if !(params_ok && results_ok) {
            return Err(Error::SignatureMismatch {
                export: name.to_string(),
                expected: describe(arity),
                found: describe_type(&ty),
            });
        }
        Ok(func)
    }

    fn func(&mut self, name: &str) -> Result<Func> {
        self.instance
            .get_func(&mut self.store, name)
            .ok_or_else(|| Error::ExportNotFound(name.to_string()))
    }

    /// Asks the guest for `size` bytes.
    pub async fn alloc(&mut self, alloc: &TypedFunc<i32, i32>, size: i32) -> Result<i32> {
        alloc.call_async(&mut self.store, size).await.map_err(Error::Trap)
    }

    /// Invokes an entrypoint and returns its single i32 result.
    pub async fn invoke(&mut self, func: &Func, params: &[Val]) -> Result<i32> {
        let mut results = [Val::I32(0)];
        func.call_async(&mut self.store, params, &mut results)
            .await
            .map_err(Error::Trap)?;
        results[0]
            .i32()
            .ok_or_else(|| Error::Trap(wasmtime::Error::msg("entrypoint result is not an i32")))
    }

    pub fn write(&mut self, memory: &GuestMemory, offset: u32, bytes: &[u8]) -> Result<()> {
        Ok(memory.write(&mut self.store, offset, bytes)?)
    }

    pub fn read(&self, memory: &GuestMemory, offset: u32, len: u32) -> Result<Vec<u8>> {
        Ok(memory.read(&self.store, offset, len)?)
    }
}

fn describe(arity: usize) -> String {
    format!("({}) -> i32", vec!["i32"; arity].join(", "))
}

fn describe_type(ty: &FuncType) -> String {
    let params: Vec<String> = ty.params().map(|p| p.to_string()).collect();
    let results: Vec<String> = ty.results().map(|r| r.to_string()).collect();
    format!("({}) -> ({})", params.join(", "), results.join(", "))
}
