//! Pool bootstrap and per-connection pragmas.
//!
//! # Responsibility
//! - Open (or create) the database file behind an `r2d2` pool.
//! - Configure each pooled connection as it is established.
//! - Run schema migrations before the pool is handed out.
//!
//! # Invariants
//! - Every pooled connection has `journal_mode=WAL` and a busy timeout.
//! - Returned pools have migrations fully applied.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use crate::config::{DbConfig, SynchronousMode};
use log::{debug, error, info, warn};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::time::{Duration, Instant};

/// Process-wide shared handle; cloning shares the same pool.
pub type DbPool = Pool<SqliteConnectionManager>;
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Pragmas applied to every new pooled connection.
#[derive(Debug, Clone)]
struct ConnectionPragmas {
    busy_timeout: Duration,
    synchronous: SynchronousMode,
    cache_size_kib: i64,
    mmap_size: i64,
    wal_autocheckpoint: i64,
}

impl ConnectionPragmas {
    fn from_config(config: &DbConfig) -> Self {
        Self {
            busy_timeout: Duration::from_millis(config.busy_timeout_ms),
            synchronous: config.synchronous,
            cache_size_kib: config.cache_size_kib,
            mmap_size: config.mmap_size,
            wal_autocheckpoint: config.wal_autocheckpoint,
        }
    }

    fn apply(&self, conn: &mut Connection) -> rusqlite::Result<()> {
        // Must precede the WAL switch so racing initial connections wait.
        conn.busy_timeout(self.busy_timeout)?;

        let mode: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
        if !mode.eq_ignore_ascii_case("wal") {
            warn!("event=db_pragma module=db status=warn pragma=journal_mode actual={mode}");
        }

        conn.execute_batch(&format!(
            "PRAGMA synchronous = {};
             PRAGMA cache_size = -{};
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = OFF;
             PRAGMA mmap_size = {};
             PRAGMA wal_autocheckpoint = {};",
            self.synchronous.pragma_value(),
            self.cache_size_kib,
            self.mmap_size,
            self.wal_autocheckpoint,
        ))?;

        debug!(
            "event=db_pragma module=db status=ok journal_mode={} synchronous={} busy_timeout_ms={}",
            mode,
            self.synchronous.pragma_value(),
            self.busy_timeout.as_millis()
        );
        Ok(())
    }
}

/// Opens the configured database file behind a bounded pool.
///
/// The file is created when absent. Existing tables and rows are kept.
///
/// # Side effects
/// - Establishes `min_idle` connections eagerly.
/// - Applies pending migrations.
/// - Emits `db_open` logging events with duration and status.
pub fn open_pool(config: &DbConfig) -> DbResult<DbPool> {
    let started_at = Instant::now();
    info!(
        "event=db_open module=db status=start path={} new_file={}",
        config.path.display(),
        !config.path.exists()
    );

    match build_pool(config) {
        Ok(pool) => {
            info!(
                "event=db_open module=db status=ok max_connections={} min_idle={} duration_ms={}",
                config.max_connections,
                config.min_idle,
                started_at.elapsed().as_millis()
            );
            Ok(pool)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

/// Reports the active journal mode of a connection.
pub fn journal_mode(conn: &Connection) -> DbResult<String> {
    let mode = conn.query_row("PRAGMA journal_mode;", [], |row| row.get(0))?;
    Ok(mode)
}

fn build_pool(config: &DbConfig) -> DbResult<DbPool> {
    config.validate().map_err(DbError::InvalidConfig)?;

    let pragmas = ConnectionPragmas::from_config(config);
    let manager =
        SqliteConnectionManager::file(&config.path).with_init(move |conn| pragmas.apply(conn));

    let pool = Pool::builder()
        .max_size(config.max_connections)
        .min_idle(Some(config.min_idle))
        .max_lifetime(Some(Duration::from_secs(config.max_lifetime_secs)))
        .connection_timeout(Duration::from_secs(config.connection_timeout_secs))
        .build(manager)?;

    let mut conn = pool.get()?;
    apply_migrations(&mut conn)?;
    Ok(pool)
}
