//! Generic record repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Execute built record queries against the shared pool.
//! - Decode rows into `Record<E>` for any entity kind.
//!
//! # Invariants
//! - Write paths validate every input before checking out a connection.
//! - Reads and updates only ever see live rows.
//! - A row that fails to decode during a list scan is logged and skipped;
//!   the remaining rows are still returned.
//! - Writes decode their returned rows before commit; a decode failure
//!   rolls the whole statement back.
//! - Every failed operation emits one `status=warn|error` event.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{DbError, DbPool, PooledConnection};
use crate::logging::sanitize_message;
use crate::model::entity::{Entity, ValidationError};
use crate::model::pagination::PaginationFilter;
use crate::model::record::Record;
use crate::query::{
    build_batch_insert, build_get, build_insert, build_list, build_soft_delete, build_update,
};
use log::{debug, error, warn};
use rusqlite::{
    params_from_iter, Connection, OptionalExtension, Rows, Transaction, TransactionBehavior,
};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use std::time::Instant;

const AUDIT_COLUMNS: &[&str] = &["created_at", "updated_at", "deleted_at"];
const MAX_ERROR_MESSAGE_CHARS: usize = 240;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for record persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    /// No live row has this id (missing or already soft-deleted).
    NotFound(i64),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "storage error: {err}"),
            Self::NotFound(id) => write!(f, "record not found or already deleted: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "database schema version {actual_version} is older than required {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<r2d2::Error> for RepoError {
    fn from(value: r2d2::Error) -> Self {
        Self::Db(DbError::Pool(value))
    }
}

/// Record data-access operations for one entity kind.
pub trait RecordRepository<E: Entity> {
    /// Lists live records matching the filter, one page at a time.
    fn list(&self, page: &PaginationFilter<E>) -> RepoResult<Vec<Record<E>>>;
    /// Gets one live record by id.
    fn get(&self, id: i64) -> RepoResult<Option<Record<E>>>;
    /// Inserts one record and returns it with assigned id and `created_at`.
    fn create(&self, entity: &E) -> RepoResult<Record<E>>;
    /// Inserts every entity in one statement; nothing is written if any
    /// item fails validation.
    fn create_batch(&self, entities: &[E]) -> RepoResult<Vec<Record<E>>>;
    /// Replaces every entity field of a live record.
    fn update(&self, id: i64, entity: &E) -> RepoResult<Record<E>>;
    /// Soft-deletes live records and returns how many rows changed.
    fn soft_delete(&self, ids: &[i64]) -> RepoResult<usize>;
}

/// SQLite-backed record repository over a shared connection pool.
pub struct SqliteRecordRepository<E> {
    pool: DbPool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for SqliteRecordRepository<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> SqliteRecordRepository<E> {
    /// Constructs a repository after checking that the entity table is ready.
    pub fn try_new(pool: DbPool) -> RepoResult<Self> {
        {
            let conn = pool.get()?;
            ensure_table_ready::<E>(&conn)?;
        }
        Ok(Self {
            pool,
            _entity: PhantomData,
        })
    }

    fn conn(&self) -> RepoResult<PooledConnection> {
        Ok(self.pool.get()?)
    }

    /// Runs `write` inside an immediate transaction and commits on success.
    ///
    /// Returned rows are decoded before commit, so a decode failure rolls the
    /// statement back instead of leaving rows the caller never saw.
    fn in_write_tx<T>(
        &self,
        write: impl FnOnce(&Transaction<'_>) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = write(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    fn query_list(&self, page: &PaginationFilter<E>) -> RepoResult<Vec<Record<E>>> {
        let query = build_list(page);
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&query.sql)?;
        let rows = stmt.query(params_from_iter(query.params))?;
        collect_records::<E>(rows)
    }

    fn query_get(&self, id: i64) -> RepoResult<Option<Record<E>>> {
        let query = build_get::<E>(id);
        let conn = self.conn()?;
        let record = conn
            .query_row(
                &query.sql,
                params_from_iter(query.params),
                Record::<E>::from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn insert_one(&self, entity: &E) -> RepoResult<Record<E>> {
        entity.validate()?;

        let query = build_insert(entity);
        self.in_write_tx(|tx| {
            let record = tx.query_row(
                &query.sql,
                params_from_iter(&query.params),
                Record::<E>::from_row,
            )?;
            Ok(record)
        })
    }

    fn insert_batch(&self, entities: &[E]) -> RepoResult<Vec<Record<E>>> {
        for (index, entity) in entities.iter().enumerate() {
            entity.validate().map_err(|err| err.at_index(index))?;
        }

        let query = build_batch_insert(entities)?;
        self.in_write_tx(|tx| {
            let mut stmt = tx.prepare(&query.sql)?;
            let records = stmt
                .query_map(params_from_iter(&query.params), Record::<E>::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(records)
        })
    }

    fn update_one(&self, id: i64, entity: &E) -> RepoResult<Record<E>> {
        entity.validate()?;

        let query = build_update(id, entity);
        self.in_write_tx(|tx| {
            tx.query_row(
                &query.sql,
                params_from_iter(&query.params),
                Record::<E>::from_row,
            )
            .optional()?
            .ok_or(RepoError::NotFound(id))
        })
    }

    fn mark_deleted(&self, ids: &[i64]) -> RepoResult<usize> {
        let query = build_soft_delete::<E>(ids)?;
        let conn = self.conn()?;
        // rusqlite reports the change count from the statement itself, so
        // there is no separate retrieval step that can fail here.
        let affected = conn.execute(&query.sql, params_from_iter(query.params))?;
        Ok(affected)
    }
}

impl<E: Entity> RecordRepository<E> for SqliteRecordRepository<E> {
    fn list(&self, page: &PaginationFilter<E>) -> RepoResult<Vec<Record<E>>> {
        let started_at = Instant::now();
        let result = self.query_list(page);
        match &result {
            Ok(records) => debug!(
                "event=record_list module=repo status=ok table={} cursor={} rows={} duration_ms={}",
                E::TABLE,
                page.cursor_id.is_some(),
                records.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure::<E>("record_list", started_at, err),
        }
        result
    }

    fn get(&self, id: i64) -> RepoResult<Option<Record<E>>> {
        let started_at = Instant::now();
        let result = self.query_get(id);
        match &result {
            Ok(record) => debug!(
                "event=record_get module=repo status=ok table={} id={} found={}",
                E::TABLE,
                id,
                record.is_some()
            ),
            Err(err) => log_failure::<E>("record_get", started_at, err),
        }
        result
    }

    fn create(&self, entity: &E) -> RepoResult<Record<E>> {
        let started_at = Instant::now();
        let result = self.insert_one(entity);
        match &result {
            Ok(record) => debug!(
                "event=record_create module=repo status=ok table={} id={} duration_ms={}",
                E::TABLE,
                record.id.unwrap_or_default(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure::<E>("record_create", started_at, err),
        }
        result
    }

    fn create_batch(&self, entities: &[E]) -> RepoResult<Vec<Record<E>>> {
        let started_at = Instant::now();
        let result = self.insert_batch(entities);
        match &result {
            Ok(records) => debug!(
                "event=record_create_batch module=repo status=ok table={} requested={} returned={} duration_ms={}",
                E::TABLE,
                entities.len(),
                records.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure::<E>("record_create_batch", started_at, err),
        }
        result
    }

    fn update(&self, id: i64, entity: &E) -> RepoResult<Record<E>> {
        let started_at = Instant::now();
        let result = self.update_one(id, entity);
        match &result {
            Ok(_) => debug!(
                "event=record_update module=repo status=ok table={} id={} duration_ms={}",
                E::TABLE,
                id,
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure::<E>("record_update", started_at, err),
        }
        result
    }

    fn soft_delete(&self, ids: &[i64]) -> RepoResult<usize> {
        let started_at = Instant::now();
        let result = self.mark_deleted(ids);
        match &result {
            Ok(affected) => debug!(
                "event=record_soft_delete module=repo status=ok table={} requested={} affected={} duration_ms={}",
                E::TABLE,
                ids.len(),
                affected,
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure::<E>("record_soft_delete", started_at, err),
        }
        result
    }
}

/// Caller mistakes log as `warn`; storage and schema failures as `error`.
fn log_failure<E: Entity>(event: &str, started_at: Instant, err: &RepoError) {
    let message = sanitize_message(&err.to_string(), MAX_ERROR_MESSAGE_CHARS);
    let duration_ms = started_at.elapsed().as_millis();
    match err {
        RepoError::Validation(_) | RepoError::NotFound(_) => warn!(
            "event={event} module=repo status=warn table={} duration_ms={duration_ms} error={message}",
            E::TABLE
        ),
        _ => error!(
            "event={event} module=repo status=error table={} duration_ms={duration_ms} error={message}",
            E::TABLE
        ),
    }
}

fn collect_records<E: Entity>(mut rows: Rows<'_>) -> RepoResult<Vec<Record<E>>> {
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        match Record::<E>::from_row(row) {
            Ok(record) => records.push(record),
            Err(err) => {
                let id = row.get::<_, i64>("id").ok();
                warn!(
                    "event=row_decode module=repo status=warn table={} id={:?} error={}",
                    E::TABLE,
                    id,
                    err
                );
            }
        }
    }
    Ok(records)
}

fn ensure_table_ready<E: Entity>(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let columns = stmt
        .query_map([E::TABLE], |row| row.get::<_, String>(0))?
        .collect::<Result<HashSet<_>, _>>()?;
    if columns.is_empty() {
        return Err(RepoError::MissingRequiredTable(E::TABLE));
    }

    let required = std::iter::once(&"id")
        .chain(E::COLUMNS)
        .chain(AUDIT_COLUMNS);
    for &column in required {
        if !columns.contains(column) {
            return Err(RepoError::MissingRequiredColumn {
                table: E::TABLE,
                column,
            });
        }
    }

    Ok(())
}
