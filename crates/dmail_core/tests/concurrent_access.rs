use dmail_core::{open_pool, DbConfig, PaginationFilter, Record, User, UserService};
use std::sync::Arc;
use std::thread;

const WRITERS: usize = 4;
const READERS: usize = 4;
const USERS_PER_WRITER: usize = 25;

fn open_shared_users(dir: &tempfile::TempDir) -> Arc<UserService> {
    let mut config = DbConfig::new(dir.path().join("concurrent.db"));
    config.max_connections = 8;
    config.min_idle = 2;
    config.busy_timeout_ms = 10_000;
    let pool = open_pool(&config).unwrap();
    Arc::new(UserService::open(pool).unwrap())
}

fn list_all(users: &UserService) -> Vec<Record<User>> {
    let mut all = Vec::new();
    let mut page = PaginationFilter::new(User::default()).with_page(0, 50);
    loop {
        let batch = users.list(&page).unwrap();
        let Some(last) = batch.last() else {
            return all;
        };
        page = page.with_cursor(last.id.unwrap());
        all.extend(batch);
    }
}

#[test]
fn writers_and_readers_share_one_pool() {
    let dir = tempfile::tempdir().unwrap();
    let users = open_shared_users(&dir);

    let mut handles = Vec::new();
    for writer in 0..WRITERS {
        let users = Arc::clone(&users);
        handles.push(thread::spawn(move || {
            for index in 0..USERS_PER_WRITER {
                users
                    .create(&User::new(format!("writer-{writer}-{index}"), 20))
                    .unwrap();
            }
        }));
    }
    for _ in 0..READERS {
        let users = Arc::clone(&users);
        handles.push(thread::spawn(move || {
            for _ in 0..USERS_PER_WRITER {
                let page = users
                    .list(&PaginationFilter::new(User::default()).with_page(0, 20))
                    .unwrap();
                assert!(page.len() <= 20);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let all = list_all(&users);
    assert_eq!(all.len(), WRITERS * USERS_PER_WRITER);
    assert!(all
        .windows(2)
        .all(|pair| pair[0].id.unwrap() < pair[1].id.unwrap()));
}

#[test]
fn racing_soft_deletes_count_each_row_once() {
    let dir = tempfile::tempdir().unwrap();
    let users = open_shared_users(&dir);
    let batch: Vec<_> = (0..40).map(|index| User::new(format!("u{index}"), 40)).collect();
    let ids: Arc<Vec<i64>> = Arc::new(
        users
            .create_batch(&batch)
            .unwrap()
            .into_iter()
            .map(|record| record.id.unwrap())
            .collect(),
    );

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let users = Arc::clone(&users);
            let ids = Arc::clone(&ids);
            thread::spawn(move || users.soft_delete(&ids).unwrap())
        })
        .collect();
    let total: usize = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .sum();

    assert_eq!(total, ids.len());
    assert!(list_all(&users).is_empty());
}
