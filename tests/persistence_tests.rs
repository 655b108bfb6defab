use jamsh::persistence;
use jamsh::scheduler::{Priority, TaskStore};
use jamsh::ShellError;
use tempfile::TempDir;

fn scenario_store() -> TaskStore {
    let mut store = TaskStore::new();
    store.add_task("a.script", Priority::High).unwrap();
    store.add_task("b.script", Priority::Low).unwrap();
    store.add_task("c.script", Priority::High).unwrap();
    store
}

#[tokio::test]
async fn test_save_writes_snapshot_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.txt");

    let count = persistence::save(&scenario_store(), &path).await.unwrap();

    assert_eq!(count, 3);
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "1,1,a.script\n3,1,c.script\n2,2,b.script\n"
    );
}

#[tokio::test]
async fn test_save_empty_store_creates_empty_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.txt");

    assert_eq!(persistence::save(&TaskStore::new(), &path).await.unwrap(), 0);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
}

#[tokio::test]
async fn test_save_overwrites_existing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.txt");
    std::fs::write(&path, "9,1,old.script\n9,1,old.script\n").unwrap();

    let mut store = TaskStore::new();
    store.add_task("new.script", Priority::Low).unwrap();
    persistence::save(&store, &path).await.unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "1,2,new.script\n");
}

#[tokio::test]
async fn test_save_to_unwritable_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("no/such/dir/tasks.txt");

    let err = persistence::save(&scenario_store(), &path).await.unwrap_err();
    assert!(matches!(err, ShellError::Io { .. }));
}

#[tokio::test]
async fn test_load_restores_queues() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.txt");
    persistence::save(&scenario_store(), &path).await.unwrap();

    let tasks = persistence::load(&path).await.unwrap();
    let mut store = TaskStore::new();
    assert_eq!(store.restore(tasks), 3);

    let restored: Vec<_> = store
        .snapshot()
        .into_iter()
        .map(|t| (t.id, t.priority, t.command))
        .collect();
    assert_eq!(
        restored,
        vec![
            (1, Priority::High, "a.script".to_string()),
            (3, Priority::High, "c.script".to_string()),
            (2, Priority::Low, "b.script".to_string()),
        ]
    );

    // New ids continue after the highest restored id
    assert_eq!(store.add_task("d.script", Priority::Low).unwrap(), 4);
}

#[tokio::test]
async fn test_load_keeps_commas_in_command() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.txt");
    std::fs::write(&path, "5,2,run.script a,b,c\n").unwrap();

    let tasks = persistence::load(&path).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, 5);
    assert_eq!(tasks[0].command, "run.script a,b,c");
}

#[tokio::test]
async fn test_load_reports_malformed_line() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.txt");
    std::fs::write(&path, "1,1,a.script\nnot-a-task\n").unwrap();

    match persistence::load(&path).await.unwrap_err() {
        ShellError::Persistence { line, .. } => assert_eq!(line, 2),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.txt");

    match persistence::load(&path).await.unwrap_err() {
        ShellError::Io { path: p, .. } => assert_eq!(p, path),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_load_rejects_largest_id() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.txt");
    std::fs::write(&path, "18446744073709551615,1,a.script\n").unwrap();

    match persistence::load(&path).await.unwrap_err() {
        ShellError::Persistence { line, reason, .. } => {
            assert_eq!(line, 1);
            assert_eq!(reason, "task id out of range");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_restore_never_reuses_cancelled_ids() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.txt");
    persistence::save(&scenario_store(), &path).await.unwrap();

    // Same ids handed out and cancelled in this session before the load
    let mut store = scenario_store();
    for id in 1..=3 {
        assert!(store.cancel_task(id));
    }

    let tasks = persistence::load(&path).await.unwrap();
    assert_eq!(store.restore(tasks), 0);
    assert!(store.is_empty());
    assert_eq!(store.add_task("d.script", Priority::Low).unwrap(), 4);
}
