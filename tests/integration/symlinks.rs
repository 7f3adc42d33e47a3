//! Symlinks are exported as copies of their targets

use crate::integration::test_utils::{tree, worked_example, CountingResolver, MemFs};
use std::sync::Arc;
use treexport::error::ExportError;
use treexport::export::Exporter;
use treexport::memory::{ChangeMemory, InMemoryChangeMemory};
use treexport::store::ObjectDb;
use treexport::tree::{Entry, EntryMode};

fn set_root(db: &ObjectDb, items: &[(&str, EntryMode, [u8; 32])]) {
    let root = tree(db, items);
    db.set_root("r", Entry::new(EntryMode::Tree, root)).unwrap();
}

fn exporter(db: &ObjectDb, memory: Arc<InMemoryChangeMemory>) -> Exporter {
    Exporter::new(Arc::new(CountingResolver::new(db.clone())), memory)
}

#[tokio::test]
async fn test_link_is_remembered_at_its_own_location() {
    let db = ObjectDb::temporary().unwrap();
    let (_, h2) = worked_example(&db);
    let memory = Arc::new(InMemoryChangeMemory::new());
    let fs = MemFs::new("dest");

    exporter(&db, memory.clone())
        .export_path("r", fs.root(), "out")
        .await
        .unwrap();

    assert_eq!(memory.get("/dest/out/d"), Some(h2));
    assert_eq!(memory.get("/dest/out/b/c"), Some(h2));
    assert_eq!(memory.len(), 3);
}

#[tokio::test]
async fn test_link_to_directory_copies_the_directory() {
    let db = ObjectDb::temporary().unwrap();
    let page = db.put_blob(b"<p>home</p>").unwrap();
    let site = tree(&db, &[("index.html", EntryMode::File, page)]);
    let link = db.put_symlink("site\n").unwrap();
    set_root(
        &db,
        &[
            ("site", EntryMode::Tree, site),
            ("www", EntryMode::Symlink, link),
        ],
    );
    let memory = Arc::new(InMemoryChangeMemory::new());
    let fs = MemFs::new("dest");

    exporter(&db, memory.clone())
        .export_path("r", fs.root(), "out")
        .await
        .unwrap();

    assert_eq!(fs.root().read("out/www/index.html").unwrap(), b"<p>home</p>");
    assert_eq!(fs.root().read("out/site/index.html").unwrap(), b"<p>home</p>");
    assert_eq!(memory.get("/dest/out/www/index.html"), Some(page));
}

#[tokio::test]
async fn test_dangling_link_is_skipped() {
    let db = ObjectDb::temporary().unwrap();
    let blob = db.put_blob(b"kept").unwrap();
    let link = db.put_symlink("nowhere/file").unwrap();
    set_root(
        &db,
        &[
            ("broken", EntryMode::Symlink, link),
            ("kept", EntryMode::File, blob),
        ],
    );
    let fs = MemFs::new("dest");

    let report = exporter(&db, Arc::new(InMemoryChangeMemory::new()))
        .export_path("r", fs.root(), "out")
        .await
        .unwrap();

    assert_eq!(report.dangling_symlinks, 1);
    assert_eq!(report.files_written, 1);
    assert_eq!(fs.root().list("out"), vec!["kept"]);
}

#[tokio::test]
async fn test_link_cycle_fails() {
    let db = ObjectDb::temporary().unwrap();
    let to_y = db.put_symlink("y").unwrap();
    let to_x = db.put_symlink("x").unwrap();
    set_root(
        &db,
        &[
            ("x", EntryMode::Symlink, to_y),
            ("y", EntryMode::Symlink, to_x),
        ],
    );
    let fs = MemFs::new("dest");

    let err = exporter(&db, Arc::new(InMemoryChangeMemory::new()))
        .with_max_symlink_depth(8)
        .export_path("r", fs.root(), "out")
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::SymlinkLoop { limit: 8, .. }));
}

#[tokio::test]
async fn test_link_to_enclosing_directory_fails() {
    let db = ObjectDb::temporary().unwrap();
    let up = db.put_symlink(".").unwrap();
    set_root(&db, &[("self", EntryMode::Symlink, up)]);
    let fs = MemFs::new("dest");

    let err = exporter(&db, Arc::new(InMemoryChangeMemory::new()))
        .with_max_symlink_depth(3)
        .export_path("r", fs.root(), "out")
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::SymlinkLoop { .. }));
}

#[tokio::test]
async fn test_link_escaping_through_parent_segments() {
    let db = ObjectDb::temporary().unwrap();
    let (_, h2) = worked_example(&db);
    let up = db.put_symlink("../b/c").unwrap();
    let nested = tree(&db, &[("alias", EntryMode::Symlink, up)]);
    let root = db.root("r").unwrap().unwrap();
    let mut items: Vec<_> = db
        .tree_children(&root)
        .unwrap()
        .into_iter()
        .map(|(name, child)| treexport::store::TreeItem::raw(name, child.raw_mode, child.hash))
        .collect();
    items.push(treexport::store::TreeItem::new("n", EntryMode::Tree, nested));
    let root = db.put_tree(items).unwrap();
    db.set_root("r", Entry::new(EntryMode::Tree, root)).unwrap();

    let memory = Arc::new(InMemoryChangeMemory::new());
    let fs = MemFs::new("dest");
    exporter(&db, memory.clone())
        .export_path("r", fs.root(), "out")
        .await
        .unwrap();

    assert_eq!(fs.root().read("out/n/alias").unwrap(), b"charlie contents");
    assert_eq!(memory.get("/dest/out/n/alias"), Some(h2));
}
