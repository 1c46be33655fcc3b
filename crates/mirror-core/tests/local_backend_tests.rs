//! Tests for the local-disk backends

use std::sync::Arc;

use mirror_core::{
    HostDirectory, LocalFs, LocalHostDirectory, SyncEngine, SyncSession, SyncSettings,
    VirtualFileTable, VirtualFs, WatcherEvent,
    backend::{read_relative, write_relative},
};
use mirror_test_utils::TestProject;
use tempfile::TempDir;

#[tokio::test]
async fn test_local_fs_primitives() {
    let dir = TempDir::new().unwrap();
    let fs = LocalFs::new(dir.path());

    fs.write_file("src/a.rs", b"fn a() {}").await.unwrap();
    fs.mkdir("docs/api", true).await.unwrap();
    fs.rename("src/a.rs", "lib/a.rs").await.unwrap();
    fs.rm("docs", true).await.unwrap();

    assert_eq!(
        std::fs::read_to_string(dir.path().join("lib/a.rs")).unwrap(),
        "fn a() {}"
    );
    assert!(!dir.path().join("src/a.rs").exists());
    assert!(!dir.path().join("docs").exists());
}

#[tokio::test]
async fn test_table_over_local_fs() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().to_string_lossy().into_owned();
    let mut table = VirtualFileTable::new(root.as_str(), Arc::new(LocalFs::new(dir.path())));

    table.create_file("notes/todo.md", "- [ ] ship").await.unwrap();
    table.save("notes/todo.md", "- [x] ship").await.unwrap();

    assert_eq!(
        std::fs::read_to_string(dir.path().join("notes/todo.md")).unwrap(),
        "- [x] ship"
    );
    assert_eq!(table.modified_files().len(), 1);
}

#[tokio::test]
async fn test_local_host_directory() {
    let dir = TempDir::new().unwrap();
    let host = LocalHostDirectory::new(dir.path());

    assert!(host.directory("app", false).await.unwrap().is_none());
    let app = host.directory("app", true).await.unwrap().unwrap();
    assert_eq!(app.name(), "app");

    write_relative(app.as_ref(), "src/main.rs", "fn main() {}").await.unwrap();

    assert_eq!(
        read_relative(&host, "app/src/main.rs").await.unwrap().as_deref(),
        Some("fn main() {}")
    );
    assert_eq!(read_relative(&host, "app/missing.rs").await.unwrap(), None);
}

#[tokio::test]
async fn test_local_host_overwrites_shorter_content() {
    let dir = TempDir::new().unwrap();
    let host = LocalHostDirectory::new(dir.path());

    host.write_file("a.txt", "a long line of text").await.unwrap();
    host.write_file("a.txt", "short").await.unwrap();

    assert_eq!(host.read_file("a.txt").await.unwrap().as_deref(), Some("short"));
}

#[tokio::test]
async fn test_sync_project_directory_to_host_directory() {
    let project = TestProject::new()
        .with_file("index.html", "<p>new</p>")
        .with_file("css/site.css", "body {}")
        .with_host_file("site/index.html", "<p>old</p>");
    let root = project.project_dir().to_string_lossy().into_owned();
    let mut table = VirtualFileTable::new(root.as_str(), Arc::new(LocalFs::new(project.project_dir())));
    table.apply_events(project.project_files().iter().map(|(relative, content)| {
        WatcherEvent::add_file(format!("{root}/{relative}"), content)
    }));
    let host = LocalHostDirectory::new(project.host_dir());
    let mut session = SyncSession::new("Site", "site");

    let entry = SyncEngine::headless()
        .sync(&table, &host, &mut session, &SyncSettings::default())
        .await
        .unwrap();

    assert_eq!(entry.statistics.new_files, 1);
    assert_eq!(entry.statistics.changed_files, 1);
    project.assert_host_file("site/index.html", "<p>new</p>");
    project.assert_host_file("site/css/site.css", "body {}");
}
