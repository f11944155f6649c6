//! Path resolution
//!
//! Deterministic mapping from a resource node to its local filesystem path.
//! Resolution never touches the filesystem and never fails; with no sync
//! root configured the result is relative to an empty root, which callers
//! must treat as "unconfigured" and refuse destructive operations on.

use crate::course::FlatResource;
use crate::tree::{NodeIdx, ResourceTree};
use std::path::{Path, PathBuf};

pub struct PathResolver;

impl PathResolver {
    /// Resolve a tree node: ancestor display names from the course root
    /// downward, then the node's own name when `include_self`.
    ///
    /// Siblings with identical names resolve to the same path; the naming
    /// scheme carries no identifier, so the ambiguity is inherent.
    pub fn resolve(
        tree: &ResourceTree,
        idx: NodeIdx,
        sync_root: Option<&Path>,
        include_self: bool,
    ) -> PathBuf {
        let mut path = sync_root.map(Path::to_path_buf).unwrap_or_default();
        for ancestor in tree.ancestors(idx) {
            path.push(&tree.node(ancestor).name);
        }
        if include_self {
            path.push(&tree.node(idx).name);
        }
        path
    }

    /// Resolve a flat resource: sync root, then the server-computed
    /// directory, then the name when `include_self`.
    pub fn resolve_flat(
        resource: &FlatResource,
        sync_root: Option<&Path>,
        include_self: bool,
    ) -> PathBuf {
        let mut path = sync_root.map(Path::to_path_buf).unwrap_or_default();
        if let Some(directory) = &resource.directory {
            for segment in directory.split('/').filter(|s| !s.is_empty()) {
                path.push(segment);
            }
        }
        if include_self {
            path.push(&resource.name);
        }
        path
    }
}
