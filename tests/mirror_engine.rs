//! Mirror engine behavior against a scripted byte source and a temp
//! sync root: round-trips, idempotent eviction, atomic replacement and
//! failure classification.

use async_trait::async_trait;
use coursemirror::course::DecodedNode;
use coursemirror::error::SyncError;
use coursemirror::mirror::fetch::{FetchResponse, ResourceFetcher};
use coursemirror::mirror::{MirrorContext, MirrorEngine};
use coursemirror::sync_state::SyncStateTracker;
use coursemirror::tree::ResourceTree;
use secrecy::SecretString;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

struct ScriptedFetcher {
    responses: Mutex<VecDeque<Result<FetchResponse, SyncError>>>,
}

impl ScriptedFetcher {
    fn new(responses: Vec<Result<FetchResponse, SyncError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
        })
    }

    fn ok(bytes: &[u8]) -> Arc<Self> {
        Self::new(vec![Ok(FetchResponse {
            status: 200,
            body: bytes.to_vec(),
        })])
    }
}

#[async_trait]
impl ResourceFetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        _resource_id: &str,
        _token: &SecretString,
    ) -> Result<FetchResponse, SyncError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected fetch")
    }
}

fn sample_tree() -> ResourceTree {
    let roots: Vec<DecodedNode> = serde_json::from_str(
        r#"[
            {"id": "f1", "name": "syllabus.pdf", "size": 1024, "type": "file"},
            {"id": "d1", "name": "slides", "type": "folder", "children": [
                {"id": "f2", "name": "week1.pdf", "size": 2048, "type": "file"}
            ]}
        ]"#,
    )
    .unwrap();
    ResourceTree::build(roots, "CS101")
}

fn ctx(root: &Path) -> MirrorContext {
    MirrorContext {
        sync_root: root.to_path_buf(),
        token: SecretString::new("bearer-token".into()),
    }
}

#[tokio::test]
async fn sync_then_offload_round_trip() {
    let tree = sample_tree();
    let week1 = tree.find_by_path(&["slides", "week1.pdf"]).unwrap();
    let root = tempfile::tempdir().unwrap();
    let engine = MirrorEngine::new(ScriptedFetcher::ok(b"week one slides"));
    let ctx = ctx(root.path());

    engine.sync(&tree, week1, &ctx).await.unwrap();

    let destination = root.path().join("slides").join("week1.pdf");
    assert_eq!(std::fs::read(&destination).unwrap(), b"week one slides");
    assert_eq!(
        SyncStateTracker::is_synced(&tree, week1, Some(root.path())),
        Some(true)
    );

    engine.offload(&tree, week1, &ctx).await.unwrap();
    assert!(!destination.exists());
    assert_eq!(
        SyncStateTracker::is_synced(&tree, week1, Some(root.path())),
        Some(false)
    );
}

#[tokio::test]
async fn offload_twice_succeeds_both_times() {
    let tree = sample_tree();
    let syllabus = tree.find_by_path(&["syllabus.pdf"]).unwrap();
    let root = tempfile::tempdir().unwrap();
    let engine = MirrorEngine::new(ScriptedFetcher::ok(b"syllabus"));
    let ctx = ctx(root.path());

    engine.sync(&tree, syllabus, &ctx).await.unwrap();
    engine.offload(&tree, syllabus, &ctx).await.unwrap();
    engine.offload(&tree, syllabus, &ctx).await.unwrap();
    assert!(!root.path().join("syllabus.pdf").exists());
}

#[tokio::test]
async fn sync_replaces_stale_copy_without_temp_residue() {
    let tree = sample_tree();
    let week1 = tree.find_by_path(&["slides", "week1.pdf"]).unwrap();
    let root = tempfile::tempdir().unwrap();
    let directory = root.path().join("slides");
    std::fs::create_dir_all(&directory).unwrap();
    std::fs::write(directory.join("week1.pdf"), b"stale").unwrap();

    let engine = MirrorEngine::new(ScriptedFetcher::ok(b"fresh"));
    engine.sync(&tree, week1, &ctx(root.path())).await.unwrap();

    assert_eq!(
        std::fs::read(directory.join("week1.pdf")).unwrap(),
        b"fresh"
    );
    let entries: Vec<_> = std::fs::read_dir(&directory).unwrap().collect();
    assert_eq!(entries.len(), 1, "no temp file may remain: {entries:?}");
}

#[tokio::test]
async fn remote_error_carries_body_message_and_keeps_previous_file() {
    let tree = sample_tree();
    let syllabus = tree.find_by_path(&["syllabus.pdf"]).unwrap();
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("syllabus.pdf"), b"previous").unwrap();

    let engine = MirrorEngine::new(ScriptedFetcher::new(vec![Ok(FetchResponse {
        status: 500,
        body: br#"{"message": "reindex in progress"}"#.to_vec(),
    })]));
    let error = engine
        .sync(&tree, syllabus, &ctx(root.path()))
        .await
        .unwrap_err();

    match error {
        SyncError::Remote { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "reindex in progress");
        }
        other => panic!("expected Remote, got {other:?}"),
    }
    assert_eq!(
        std::fs::read(root.path().join("syllabus.pdf")).unwrap(),
        b"previous"
    );
}

#[tokio::test]
async fn transport_failure_leaves_previous_file_intact() {
    let tree = sample_tree();
    let syllabus = tree.find_by_path(&["syllabus.pdf"]).unwrap();
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("syllabus.pdf"), b"previous").unwrap();

    let engine = MirrorEngine::new(ScriptedFetcher::new(vec![Err(SyncError::Transport(
        "connection reset".to_string(),
    ))]));
    let error = engine
        .sync(&tree, syllabus, &ctx(root.path()))
        .await
        .unwrap_err();

    assert!(matches!(error, SyncError::Transport(_)));
    assert_eq!(
        std::fs::read(root.path().join("syllabus.pdf")).unwrap(),
        b"previous"
    );
}

#[cfg(unix)]
#[tokio::test]
async fn write_into_readonly_root_is_a_permission_error() {
    use std::os::unix::fs::PermissionsExt;

    let tree = sample_tree();
    let syllabus = tree.find_by_path(&["syllabus.pdf"]).unwrap();
    let root = tempfile::tempdir().unwrap();
    std::fs::set_permissions(root.path(), std::fs::Permissions::from_mode(0o555)).unwrap();

    // Some environments (root user) ignore directory permissions; skip there.
    if std::fs::write(root.path().join(".probe"), b"x").is_ok() {
        std::fs::set_permissions(root.path(), std::fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let engine = MirrorEngine::new(ScriptedFetcher::ok(b"bytes"));
    let error = engine
        .sync(&tree, syllabus, &ctx(root.path()))
        .await
        .unwrap_err();
    assert!(matches!(error, SyncError::Permission(_)));

    std::fs::set_permissions(root.path(), std::fs::Permissions::from_mode(0o755)).unwrap();
}

#[tokio::test]
async fn offloading_a_folder_touches_only_its_own_path() {
    let tree = sample_tree();
    let slides = tree.find_by_path(&["slides"]).unwrap();
    let week1 = tree.find_by_path(&["slides", "week1.pdf"]).unwrap();
    let root = tempfile::tempdir().unwrap();
    let engine = MirrorEngine::new(ScriptedFetcher::ok(b"week one"));
    let ctx = ctx(root.path());

    engine.sync(&tree, week1, &ctx).await.unwrap();
    engine.offload(&tree, slides, &ctx).await.unwrap();
    assert!(!root.path().join("slides").exists());

    // The child's own offload still reports success afterwards.
    engine.offload(&tree, week1, &ctx).await.unwrap();
}

#[tokio::test]
async fn flat_resources_round_trip_through_their_directory_string() {
    let flat: coursemirror::course::FlatResource = serde_json::from_str(
        r#"{"id": "f2", "name": "week1.pdf", "type": "file", "directory": "CS101/slides"}"#,
    )
    .unwrap();
    let root = tempfile::tempdir().unwrap();
    let engine = MirrorEngine::new(ScriptedFetcher::ok(b"week one"));
    let ctx = ctx(root.path());

    engine.sync_flat(&flat, &ctx).await.unwrap();
    let destination = root.path().join("CS101").join("slides").join("week1.pdf");
    assert_eq!(std::fs::read(&destination).unwrap(), b"week one");
    assert_eq!(
        SyncStateTracker::is_synced_flat(&flat, Some(root.path())),
        Some(true)
    );

    engine.offload_flat(&flat, &ctx).await.unwrap();
    assert!(!destination.exists());
    assert_eq!(
        SyncStateTracker::is_synced_flat(&flat, Some(root.path())),
        Some(false)
    );
}

#[tokio::test]
async fn offload_all_attempts_every_node() {
    let tree = sample_tree();
    let syllabus = tree.find_by_path(&["syllabus.pdf"]).unwrap();
    let week1 = tree.find_by_path(&["slides", "week1.pdf"]).unwrap();
    let root = tempfile::tempdir().unwrap();
    let engine = MirrorEngine::new(ScriptedFetcher::new(vec![
        Ok(FetchResponse {
            status: 200,
            body: b"syllabus".to_vec(),
        }),
        Ok(FetchResponse {
            status: 200,
            body: b"week one".to_vec(),
        }),
    ]));
    let ctx = ctx(root.path());

    engine.sync(&tree, syllabus, &ctx).await.unwrap();
    engine.sync(&tree, week1, &ctx).await.unwrap();

    engine.offload_all(&tree, &tree.flatten_all(), &ctx).await;
    assert!(!root.path().join("syllabus.pdf").exists());
    assert!(!root.path().join("slides").join("week1.pdf").exists());
}
