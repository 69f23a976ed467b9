use dmail_core::{
    init_logging, open_pool, DbConfig, Mall, MallService, RepoError, User, UserService,
};
use log::Log;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

// Outlives the test: the logger keeps writing here for the rest of the process.
fn unique_log_dir() -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!(
        "dmail-repo-logging-{}-{nanos}",
        std::process::id()
    ))
}

fn read_logs(log_dir: &Path) -> String {
    log::logger().flush();
    let mut content = String::new();
    for entry in std::fs::read_dir(log_dir).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().is_some_and(|ext| ext == "log") {
            content.push_str(&std::fs::read_to_string(path).unwrap());
        }
    }
    content
}

#[test]
fn failed_operations_emit_outcome_events() {
    let log_dir = unique_log_dir();
    init_logging("debug", log_dir.to_str().unwrap()).unwrap();

    let db_dir = tempfile::tempdir().unwrap();
    let mut config = DbConfig::new(db_dir.path().join("logging.db"));
    config.max_connections = 2;
    config.min_idle = 1;
    let pool = open_pool(&config).unwrap();
    let users = UserService::open(pool.clone()).unwrap();
    let malls = MallService::open(pool.clone()).unwrap();

    pool.get()
        .unwrap()
        .execute_batch(
            "CREATE TRIGGER reject_boom BEFORE INSERT ON malls
             WHEN NEW.name = 'Boom'
             BEGIN SELECT RAISE(ABORT, 'boom'); END;",
        )
        .unwrap();
    assert!(matches!(
        malls.create_batch(&[Mall::new("Boom", "Nowhere")]),
        Err(RepoError::Db(_))
    ));
    assert!(matches!(
        users.update(4242, &User::new("Alice", 30)),
        Err(RepoError::NotFound(4242))
    ));
    users.create(&User::new("Alice", 30)).unwrap();

    let logs = read_logs(&log_dir);
    assert!(logs.contains(
        "event=record_create_batch module=repo status=error table=malls"
    ));
    assert!(logs.contains("boom"));
    assert!(logs.contains("event=record_update module=repo status=warn table=users"));
    assert!(logs.contains("event=record_create module=repo status=ok table=users"));
    assert!(!logs.contains("Alice"));
}
