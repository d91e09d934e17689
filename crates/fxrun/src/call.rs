//! # Call
//!
//! Executes a deployed function against stored arguments and stores the result.
//!
//! A call walks a fixed pipeline and stops at the first failure:
//!
//! 1. fetch and decode the manifest
//! 2. fetch the bytecode
//! 3. fetch every argument, in order
//! 4. load the module and instantiate it with no imports
//! 5. resolve memory, allocator, and entrypoint
//! 6. allocate, copy the linear input in, invoke
//! 7. read the output and put it in the store
//!
//! Nothing is written to the store unless step 7 is reached, so a failed call
//! leaves the store untouched.

use std::future::Future;

use fxstore::ContentId;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::convention::Linear;
use crate::error::ArgumentError;
use crate::error::Error;
use crate::error::Result;
use crate::runtime::Runtime;
use crate::sandbox;

impl Runtime {
    /// Calls `entrypoint` of the function deployed as `manifest_id` with the
    /// blobs named by `args`, returning the id of the output blob.
    ///
    /// Identical calls produce identical ids as long as the guest code is
    /// deterministic.
    #[tracing::instrument(skip(self, manifest_id, args), fields(manifest = %manifest_id, args = args.len()))]
    pub async fn call(&self, manifest_id: &ContentId, entrypoint: &str, args: &[ContentId]) -> Result<ContentId> {
        let outcome = match self.execute(manifest_id, entrypoint, args).await {
            Ok(output) => self.store().put(&output).await.map_err(Error::from),
            Err(e) => Err(e),
        };

        match &outcome {
            Ok(result) => {
                self.record_call(true);
                info!(%result, "call complete");
            }
            Err(e) => {
                self.record_call(false);
                warn!(class = ?e.class(), error = %e, "call failed");
            }
        }
        outcome
    }

    /// Like [`Runtime::call`], but gives up with [`Error::Cancelled`] as soon as
    /// `cancel` resolves, even while guest code is running. A cancelled call
    /// never stores a result and counts as a failed call.
    pub async fn call_with_cancel<F>(
        &self,
        manifest_id: &ContentId,
        entrypoint: &str,
        args: &[ContentId],
        cancel: F,
    ) -> Result<ContentId>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = cancel => {
                self.record_call(false);
                warn!(manifest = %manifest_id, "call cancelled");
                Err(Error::Cancelled)
            }
            outcome = self.call(manifest_id, entrypoint, args) => outcome,
        }
    }

    async fn execute(&self, manifest_id: &ContentId, entrypoint: &str, args: &[ContentId]) -> Result<Vec<u8>> {
        let manifest = self.manifest(manifest_id).await?;
        let config = self.config();

        if config.get_check_arity() && manifest.args().len() != args.len() {
            return Err(ArgumentError::CountMismatch {
                expected: manifest.args().len(),
                found: args.len(),
            }
            .into());
        }

        let bytecode_id = manifest.bytecode();
        let bytecode = match self.store().get(&bytecode_id).await {
            Ok(bytes) => bytes,
            Err(fxstore::Error::NotFound(_)) => return Err(Error::BytecodeNotFound(bytecode_id)),
            Err(e) => return Err(e.into()),
        };

        let mut blobs = Vec::with_capacity(args.len());
        for (index, id) in args.iter().enumerate() {
            match self.store().get(id).await {
                Ok(bytes) => blobs.push(bytes),
                Err(fxstore::Error::NotFound(_)) => {
                    return Err(ArgumentError::NotFound { index, id: *id }.into());
                }
                Err(e) => return Err(e.into()),
            }
        }
        let linear = Linear::new(&blobs)?;
        let alloc_size = linear.alloc_size(config.get_slack())?;
        debug!(input_len = linear.buffer().len(), alloc_size, "arguments fetched");

        let module = self.sandbox().load(bytecode_id, &bytecode)?;
        let mut session = self.sandbox().instantiate(&module).await?;

        let memory = session.memory(config.get_memory_export())?;
        let alloc = session.allocator(config.get_alloc_export())?;
        if !manifest.has_entrypoint(entrypoint) {
            return Err(sandbox::Error::ExportNotFound(entrypoint.to_string()).into());
        }
        let func = session.entrypoint(entrypoint, 1 + args.len())?;

        let base = session.alloc(&alloc, alloc_size).await?;
        // Guest pointers are unsigned addresses carried in an i32.
        let offset = base as u32;
        session.write(&memory, offset, linear.buffer())?;

        let result_len = session.invoke(&func, &linear.params(base)).await?;
        let len = u32::try_from(result_len).map_err(|_| sandbox::Error::InvalidResultLength(result_len))?;
        debug!(base = offset, len, "entrypoint returned");

        Ok(session.read(&memory, offset, len)?)
    }
}
