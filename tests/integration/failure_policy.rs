//! Sibling handling after a failed child export

use crate::integration::test_utils::{tree, CountingResolver, MemFs};
use std::sync::Arc;
use std::time::Duration;
use treexport::error::{ExportError, FileStage, StorageError};
use treexport::export::{Exporter, FailurePolicy};
use treexport::hook::{ExportHook, ExportSettings};
use treexport::memory::{ChangeMemory, InMemoryChangeMemory};
use treexport::progress::ProgressNode;
use treexport::store::ObjectDb;
use treexport::tree::{Entry, EntryMode};
use treexport::types::Hash;

/// Root `r` with one unloadable file `bad` and two good ones
fn one_bad_file(db: &ObjectDb) -> Hash {
    let bad = db.put_blob(b"unreachable").unwrap();
    let good = db.put_blob(b"good").unwrap();
    let slow = db.put_blob(b"slow").unwrap();
    let root = tree(
        db,
        &[
            ("bad", EntryMode::File, bad),
            ("good", EntryMode::File, good),
            ("slow", EntryMode::File, slow),
        ],
    );
    db.set_root("r", Entry::new(EntryMode::Tree, root)).unwrap();
    bad
}

#[tokio::test]
async fn test_failing_blob_reports_one_failure() {
    for policy in [FailurePolicy::FailFast, FailurePolicy::DrainSiblings] {
        let db = ObjectDb::temporary().unwrap();
        let bad = one_bad_file(&db);
        let resolver = CountingResolver::new(db.clone()).fail_blob(bad);
        let exporter = Exporter::new(Arc::new(resolver), Arc::new(InMemoryChangeMemory::new()))
            .with_policy(policy);
        let fs = Arc::new(MemFs::new("dest"));
        let progress = Arc::new(ProgressNode::new("policy"));
        let settings = ExportSettings {
            entry: "dest".to_string(),
            source: "r".to_string(),
            name: "out".to_string(),
        };

        let hook = ExportHook::bind(progress.clone(), settings, fs.clone(), exporter, None);
        assert!(hook.wait_restored().await);
        let outcome = hook.trigger(serde_json::json!({})).await.unwrap();

        assert!(matches!(
            outcome,
            Err(ExportError::StorageError(StorageError::ObjectNotFound(_)))
        ));
        assert_eq!(progress.failures().len(), 1, "{:?}", policy);
        assert!(!progress.pulse());
    }
}

#[tokio::test]
async fn test_fail_fast_does_not_wait_for_siblings() {
    let db = ObjectDb::temporary().unwrap();
    let bad = one_bad_file(&db);
    let resolver = CountingResolver::new(db.clone())
        .fail_blob(bad)
        .stall_forever("r/slow");
    let exporter = Exporter::new(Arc::new(resolver), Arc::new(InMemoryChangeMemory::new()))
        .with_policy(FailurePolicy::FailFast);
    let fs = MemFs::new("dest");

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        exporter.export_path("r", fs.root(), "out"),
    )
    .await
    .expect("fail-fast export must not wait on a stalled sibling");

    assert!(outcome.is_err());
    assert_eq!(fs.root().read("out/slow"), None);
}

#[tokio::test]
async fn test_drain_siblings_lets_siblings_finish() {
    let db = ObjectDb::temporary().unwrap();
    let bad = one_bad_file(&db);
    let resolver = CountingResolver::new(db.clone())
        .fail_blob(bad)
        .delay("r/slow", Duration::from_millis(50));
    let memory = Arc::new(InMemoryChangeMemory::new());
    let exporter = Exporter::new(Arc::new(resolver), memory.clone())
        .with_policy(FailurePolicy::DrainSiblings);
    let fs = MemFs::new("dest");

    let err = exporter
        .export_path("r", fs.root(), "out")
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::StorageError(_)));
    assert_eq!(fs.root().read("out/slow").unwrap(), b"slow");
    assert_eq!(fs.root().read("out/good").unwrap(), b"good");
    assert!(memory.get("/dest/out/slow").is_some());
    assert_eq!(memory.get("/dest/out/bad"), None);
}

#[tokio::test]
async fn test_drain_siblings_keeps_first_error() {
    let db = ObjectDb::temporary().unwrap();
    let first = db.put_blob(b"first").unwrap();
    let second = db.put_blob(b"second").unwrap();
    let root = tree(
        &db,
        &[
            ("one", EntryMode::File, first),
            ("two", EntryMode::File, second),
        ],
    );
    db.set_root("r", Entry::new(EntryMode::Tree, root)).unwrap();
    let resolver = CountingResolver::new(db.clone())
        .fail_blob(first)
        .fail_blob(second)
        .delay("r/two", Duration::from_millis(30));
    let exporter = Exporter::new(Arc::new(resolver), Arc::new(InMemoryChangeMemory::new()))
        .with_policy(FailurePolicy::DrainSiblings);
    let fs = MemFs::new("dest");

    let err = exporter
        .export_path("r", fs.root(), "out")
        .await
        .unwrap_err();
    match err {
        ExportError::StorageError(StorageError::ObjectNotFound(hash)) => {
            assert_eq!(hash, treexport::types::hash_hex(&first));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_fail_fast_finishes_a_started_write() {
    let db = ObjectDb::temporary().unwrap();
    let bad = db.put_blob(b"bad").unwrap();
    let slow = db.put_blob(b"new").unwrap();
    let root = tree(
        &db,
        &[
            ("bad", EntryMode::File, bad),
            ("slow", EntryMode::File, slow),
        ],
    );
    db.set_root("r", Entry::new(EntryMode::Tree, root)).unwrap();

    let fs = MemFs::new("dest");
    fs.root()
        .seed_dir("out")
        .seed_file("slow", b"previous longer body");
    fs.fail_file("/dest/out/bad", FileStage::OpeningFile);
    fs.delay_truncate("/dest/out/slow", Duration::from_millis(50));

    // `bad` fails while `slow` sits between its write and its truncate
    let resolver = CountingResolver::new(db.clone()).delay("r/bad", Duration::from_millis(10));
    let memory = Arc::new(InMemoryChangeMemory::new());
    let exporter = Exporter::new(Arc::new(resolver), memory.clone())
        .with_policy(FailurePolicy::FailFast);

    let err = exporter
        .export_path("r", fs.root(), "out")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ExportError::WriteFailed {
            stage: FileStage::OpeningFile,
            ..
        }
    ));
    assert_eq!(fs.root().read("out/slow").unwrap(), b"new");
    assert_eq!(fs.counters().truncates(), 1);
    assert_eq!(memory.get("/dest/out/slow"), Some(slow));
}
