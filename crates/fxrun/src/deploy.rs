//! Deploy: publish bytecode and its manifest, return the manifest's id.

use fxstore::ContentId;
use tracing::debug;
use tracing::info;

use crate::error::Result;
use crate::manifest;
use crate::manifest::FunctionManifest;
use crate::manifest::TypeDescriptor;
use crate::runtime::Runtime;

impl Runtime {
    /// Stores `bytecode`, then a manifest pointing at it, and returns the
    /// manifest id. That id is the function's identity.
    ///
    /// Entrypoint names are not checked against the bytecode here; a name the
    /// module does not export fails at call time. An empty entrypoint list is
    /// rejected before anything is written.
    ///
    /// Deploying identical inputs twice yields the same id and no new blobs.
    #[tracing::instrument(skip_all, fields(bytecode_len = bytecode.len()))]
    pub async fn deploy<E, A>(&self, bytecode: &[u8], entrypoints: E, args: A) -> Result<ContentId>
    where
        E: IntoIterator,
        E::Item: Into<String>,
        A: IntoIterator<Item = TypeDescriptor>,
    {
        let entrypoints: Vec<String> = entrypoints.into_iter().map(Into::into).collect();
        let args: Vec<TypeDescriptor> = args.into_iter().collect();
        if entrypoints.is_empty() {
            return Err(manifest::Error::EmptyEntrypoints.into());
        }

        let bytecode_id = self.store().put(bytecode).await?;
        debug!(%bytecode_id, "bytecode stored");

        let manifest = FunctionManifest::new(entrypoints, bytecode_id, args)?;
        let manifest_id = self.store().put(&manifest.encode()?).await?;

        self.record_deploy();
        info!(%manifest_id, entrypoints = ?manifest.entrypoints(), "deployed");
        Ok(manifest_id)
    }
}
