use super::*;
use crate::test_utils::{DAILY_ORDERS_VIEW, ORDERS_DDL};
use std::fs;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn test_open_missing_directory() {
    let result = Workspace::open(Path::new("/definitely/not/here"));
    assert!(matches!(result, Err(CoreError::WorkspaceNotFound { .. })));
}

#[test]
fn test_discover_recurses_and_sorts() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "models/b.sql", "SELECT 1");
    write(dir.path(), "models/nested/a.SQL", "SELECT 1");
    write(dir.path(), "models/readme.md", "# not sql");
    write(dir.path(), "target/compiled.sql", "SELECT 1");

    let ws = Workspace::open(dir.path()).unwrap();
    let files: Vec<String> = ws
        .discover()
        .unwrap()
        .iter()
        .map(|p| ws.relative_path(p))
        .collect();
    assert_eq!(files, vec!["models/b.sql", "models/nested/a.SQL"]);
}

#[test]
fn test_discover_honours_config_paths() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "lineage.yml",
        "sql_paths: [warehouse]\nexclude_paths: [warehouse/scratch]\n",
    );
    write(dir.path(), "warehouse/orders.sql", ORDERS_DDL);
    write(dir.path(), "warehouse/scratch/tmp.sql", "SELECT 1");
    write(dir.path(), "other/ignored.sql", "SELECT 1");

    let ws = Workspace::open(dir.path()).unwrap();
    let files = ws.discover().unwrap();
    assert_eq!(files.len(), 1);
    assert!(ws.is_indexed(&files[0]));
    assert!(!ws.is_indexed(&dir.path().join("other/ignored.sql")));
    assert!(!ws.is_indexed(&dir.path().join("warehouse/scratch/tmp.sql")));
    assert!(!ws.is_indexed(&dir.path().join("warehouse/notes.txt")));
}

#[test]
fn test_load_builds_graph() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "orders.sql", ORDERS_DDL);
    write(dir.path(), "views/daily_orders.sql", DAILY_ORDERS_VIEW);
    write(dir.path(), "broken.sql", "SELEC nope");

    let ws = Workspace::open(dir.path()).unwrap();
    let builder = ws.load().unwrap();
    assert_eq!(builder.file_count(), 3);

    let graph = builder.build();
    assert!(graph.contains("table:orders"));
    let view = graph.node("view:daily_orders").unwrap();
    assert_eq!(
        view.metadata.file_path.as_deref(),
        Some("views/daily_orders.sql")
    );
    assert_eq!(graph.diagnostics().len(), 1);
    assert_eq!(graph.diagnostics()[0].file_path, "broken.sql");
}

#[test]
fn test_load_file_removes_unreadable_file() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "orders.sql", ORDERS_DDL);
    let ws = Workspace::open(dir.path()).unwrap();
    let mut builder = ws.load().unwrap();

    let path = dir.path().join("orders.sql");
    fs::remove_file(&path).unwrap();
    assert!(ws.load_file(&mut builder, &path));
    assert_eq!(builder.file_count(), 0);
}

#[test]
fn test_relative_and_absolute_paths() {
    let ws = Workspace::with_config(PathBuf::from("/ws"), Config::default());
    assert_eq!(ws.relative_path(Path::new("/ws/a/b.sql")), "a/b.sql");
    assert_eq!(ws.absolute_path("a/b.sql"), PathBuf::from("/ws/a/b.sql"));
}
