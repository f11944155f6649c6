//! Sync state
//!
//! Point-in-time answer to "does a local copy of this node exist?". The
//! filesystem can change out-of-band (manual deletion, external sync
//! clients), so this is a fresh probe on every call, never a cached flag;
//! callers re-poll on their own interval.

use crate::course::FlatResource;
use crate::path::PathResolver;
use crate::tree::{NodeIdx, ResourceTree};
use std::path::Path;

pub struct SyncStateTracker;

impl SyncStateTracker {
    /// `None` when no sync root is configured; otherwise whether anything
    /// exists at the node's resolved path.
    pub fn is_synced(tree: &ResourceTree, idx: NodeIdx, sync_root: Option<&Path>) -> Option<bool> {
        let root = sync_root?;
        Some(PathResolver::resolve(tree, idx, Some(root), true).exists())
    }

    /// Flat-model variant of [`SyncStateTracker::is_synced`].
    pub fn is_synced_flat(resource: &FlatResource, sync_root: Option<&Path>) -> Option<bool> {
        let root = sync_root?;
        Some(PathResolver::resolve_flat(resource, Some(root), true).exists())
    }
}
