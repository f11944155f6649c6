//! Mirror engine
//!
//! Materializes ("sync") and evicts ("offload") local copies of remote
//! resources. Downloads replace the destination atomically: bytes land in a
//! temp file in the destination directory and are renamed into place, so a
//! partially-written file is never observable at the final path. Operations
//! on the same resolved path are serialized; different paths proceed
//! concurrently, and blocking filesystem work is dispatched off the async
//! worker so it cannot stall operations for other nodes.

pub mod fetch;

use crate::concurrency::PathLockManager;
use crate::error::{remote_message, SyncError};
use crate::path::PathResolver;
use crate::tree::{NodeIdx, ResourceTree};
use fetch::ResourceFetcher;
use secrecy::SecretString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Explicit configuration for one engine invocation.
///
/// Passed per call rather than read from ambient state, so the same engine
/// can run against multiple sync roots and credentials.
#[derive(Clone)]
pub struct MirrorContext {
    pub sync_root: PathBuf,
    pub token: SecretString,
}

pub struct MirrorEngine {
    fetcher: Arc<dyn ResourceFetcher>,
    locks: PathLockManager,
}

impl MirrorEngine {
    pub fn new(fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self {
            fetcher,
            locks: PathLockManager::new(),
        }
    }

    /// Download a tree node's bytes and atomically replace its local copy.
    ///
    /// Placeholder nodes (no identifier) are rejected with
    /// [`SyncError::InvalidNode`].
    pub async fn sync(
        &self,
        tree: &ResourceTree,
        idx: NodeIdx,
        ctx: &MirrorContext,
    ) -> Result<(), SyncError> {
        let node = tree.node(idx);
        let id = node.id.as_deref().ok_or(SyncError::InvalidNode)?;
        let destination = PathResolver::resolve(tree, idx, Some(&ctx.sync_root), true);
        self.sync_at(id, destination, &ctx.token).await
    }

    /// Flat-model variant of [`MirrorEngine::sync`].
    pub async fn sync_flat(
        &self,
        resource: &crate::course::FlatResource,
        ctx: &MirrorContext,
    ) -> Result<(), SyncError> {
        let destination = PathResolver::resolve_flat(resource, Some(&ctx.sync_root), true);
        self.sync_at(&resource.id, destination, &ctx.token).await
    }

    async fn sync_at(
        &self,
        id: &str,
        destination: PathBuf,
        token: &SecretString,
    ) -> Result<(), SyncError> {
        let lock = self.locks.lock_for(&destination);
        let _guard = lock.lock().await;

        debug!(resource = %id, path = %destination.display(), "Fetching resource");
        let response = self.fetcher.fetch(id, token).await?;
        if response.status != 200 {
            let message = remote_message(&response.body);
            warn!(resource = %id, status = response.status, message = %message, "Remote rejected fetch");
            return Err(SyncError::Remote {
                status: response.status,
                message,
            });
        }

        let bytes = response.body;
        let size = bytes.len();
        let path = destination.clone();
        spawn_fs(move || write_replace(&path, &bytes)).await?;

        info!(resource = %id, path = %destination.display(), bytes = size, "Resource synced");
        Ok(())
    }

    /// Delete the local copy at a tree node's own resolved path.
    ///
    /// Succeeds when nothing exists (idempotent). Child nodes are never
    /// visited: each descendant has its own path and sync state.
    pub async fn offload(
        &self,
        tree: &ResourceTree,
        idx: NodeIdx,
        ctx: &MirrorContext,
    ) -> Result<(), SyncError> {
        let destination = PathResolver::resolve(tree, idx, Some(&ctx.sync_root), true);
        self.offload_at(destination).await
    }

    /// Flat-model variant of [`MirrorEngine::offload`].
    pub async fn offload_flat(
        &self,
        resource: &crate::course::FlatResource,
        ctx: &MirrorContext,
    ) -> Result<(), SyncError> {
        let destination = PathResolver::resolve_flat(resource, Some(&ctx.sync_root), true);
        self.offload_at(destination).await
    }

    async fn offload_at(&self, destination: PathBuf) -> Result<(), SyncError> {
        let lock = self.locks.lock_for(&destination);
        let _guard = lock.lock().await;

        let path = destination.clone();
        spawn_fs(move || remove_if_present(&path)).await?;
        debug!(path = %destination.display(), "Resource offloaded");
        Ok(())
    }

    /// Best-effort bulk eviction over a flattened node list.
    ///
    /// Per-node failures are logged and swallowed; the pass never aborts
    /// early and reports nothing beyond having attempted every node.
    pub async fn offload_all(&self, tree: &ResourceTree, indices: &[NodeIdx], ctx: &MirrorContext) {
        for &idx in indices {
            if let Err(error) = self.offload(tree, idx, ctx).await {
                warn!(
                    node = %tree.node(idx).name,
                    error = %error,
                    "Offload failed; continuing"
                );
            }
        }
        info!(count = indices.len(), "Bulk offload attempted");
    }
}

/// Run blocking filesystem work without stalling the async worker.
async fn spawn_fs<F>(work: F) -> Result<(), SyncError>
where
    F: FnOnce() -> Result<(), SyncError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| SyncError::Filesystem(std::io::Error::new(std::io::ErrorKind::Other, e)))?
}

/// Remove any stale copy, create missing parents, then write via a temp
/// file in the destination directory and rename into place.
fn write_replace(destination: &Path, bytes: &[u8]) -> Result<(), SyncError> {
    remove_if_present(destination)?;

    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| SyncError::from_io(parent, e))?;
        }
    }

    // Temp file in the same directory, so the rename stays on one filesystem.
    let temp_name = format!(
        ".{}.{}.tmp",
        destination
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = destination.with_file_name(&temp_name);

    let written = write_and_rename(&temp_path, destination, bytes);
    if written.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    written.map_err(|e| SyncError::from_io(destination, e))
}

fn write_and_rename(temp_path: &Path, destination: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(temp_path, destination)
}

/// Delete whatever exists at `path` (file or directory); absent is success.
fn remove_if_present(path: &Path) -> Result<(), SyncError> {
    match fs::symlink_metadata(path) {
        Ok(metadata) => {
            let removed = if metadata.is_dir() {
                fs::remove_dir_all(path)
            } else {
                fs::remove_file(path)
            };
            removed.map_err(|e| SyncError::from_io(path, e))
        }
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(SyncError::from_io(path, error)),
    }
}
