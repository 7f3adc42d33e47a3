//! Import a directory with the snapshot builder, export it onto local disk

use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use treexport::dest::{DestinationFs, LocalFs};
use treexport::export::Exporter;
use treexport::memory::{InMemoryChangeMemory, SledChangeMemory};
use treexport::store::ObjectDb;
use treexport::tree::builder::SnapshotBuilder;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn site(root: &Path) {
    write(root, "index.html", "<h1>Home</h1>");
    write(root, "posts/one.md", "# One");
    write(root, "posts/two.md", "# Two");
    write(root, "assets/css/site.css", "body { margin: 0 }");
    #[cfg(unix)]
    std::os::unix::fs::symlink("posts/two.md", root.join("latest.md")).unwrap();
}

#[tokio::test]
async fn test_snapshot_round_trips_to_disk() {
    let source = TempDir::new().unwrap();
    site(source.path());
    let dest = TempDir::new().unwrap();

    let db = ObjectDb::temporary().unwrap();
    SnapshotBuilder::new(source.path().to_path_buf())
        .import(&db, "site")
        .unwrap();

    let root = LocalFs
        .restore(dest.path().to_str().unwrap())
        .await
        .unwrap();
    let report = Exporter::new(
        Arc::new(db.clone()),
        Arc::new(InMemoryChangeMemory::new()),
    )
    .export_path("site", root, "public")
    .await
    .unwrap();

    let public = dest.path().join("public");
    for rel in [
        "index.html",
        "posts/one.md",
        "posts/two.md",
        "assets/css/site.css",
    ] {
        assert_eq!(
            fs::read(public.join(rel)).unwrap(),
            fs::read(source.path().join(rel)).unwrap(),
            "{rel}"
        );
    }

    #[cfg(unix)]
    {
        let latest = public.join("latest.md");
        assert!(!fs::symlink_metadata(&latest).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(latest).unwrap(), "# Two");
        assert_eq!(report.files_written, 5);
    }
}

#[tokio::test]
async fn test_existing_longer_file_is_truncated() {
    let source = TempDir::new().unwrap();
    write(source.path(), "notes.txt", "short");
    let dest = TempDir::new().unwrap();
    write(
        dest.path(),
        "out/notes.txt",
        "this previous version was considerably longer",
    );

    let db = ObjectDb::temporary().unwrap();
    SnapshotBuilder::new(source.path().to_path_buf())
        .import(&db, "src")
        .unwrap();
    let root = LocalFs
        .restore(dest.path().to_str().unwrap())
        .await
        .unwrap();
    Exporter::new(
        Arc::new(db.clone()),
        Arc::new(InMemoryChangeMemory::new()),
    )
    .export_path("src", root, "out")
    .await
    .unwrap();

    assert_eq!(
        fs::read_to_string(dest.path().join("out/notes.txt")).unwrap(),
        "short"
    );
}

#[tokio::test]
async fn test_persisted_memory_skips_on_next_process() {
    let source = TempDir::new().unwrap();
    site(source.path());
    let dest = TempDir::new().unwrap();
    let storage = TempDir::new().unwrap();

    {
        let db = ObjectDb::new(storage.path().join("objects")).unwrap();
        SnapshotBuilder::new(source.path().to_path_buf())
            .import(&db, "site")
            .unwrap();
        let memory = SledChangeMemory::new(db.db()).unwrap();
        let root = LocalFs
            .restore(dest.path().to_str().unwrap())
            .await
            .unwrap();
        let report = Exporter::new(Arc::new(db.clone()), Arc::new(memory))
            .export_path("site", root, "public")
            .await
            .unwrap();
        assert!(report.files_written > 0);
        db.flush().unwrap();
    }

    let db = ObjectDb::new(storage.path().join("objects")).unwrap();
    let memory = SledChangeMemory::new(db.db()).unwrap();
    let root = LocalFs
        .restore(dest.path().to_str().unwrap())
        .await
        .unwrap();
    let report = Exporter::new(Arc::new(db.clone()), Arc::new(memory))
        .export_path("site", root, "public")
        .await
        .unwrap();
    assert!(report.is_noop());
    assert_eq!(report.files_skipped, if cfg!(unix) { 5 } else { 4 });
}
