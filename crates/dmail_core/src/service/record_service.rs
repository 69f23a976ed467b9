//! Record use-case service.
//!
//! # Responsibility
//! - Provide list/get/create/update/soft-delete entry points per entity kind.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::db::DbPool;
use crate::model::entity::{Entity, ValidationError};
use crate::model::mall::Mall;
use crate::model::pagination::PaginationFilter;
use crate::model::record::Record;
use crate::model::user::User;
use crate::repo::record_repo::{RecordRepository, RepoResult, SqliteRecordRepository};
use std::marker::PhantomData;

/// Use-case service wrapper for record operations of one entity kind.
pub struct RecordService<E, R> {
    repo: R,
    _entity: PhantomData<fn() -> E>,
}

pub type UserService = RecordService<User, SqliteRecordRepository<User>>;
pub type MallService = RecordService<Mall, SqliteRecordRepository<Mall>>;

impl<E: Entity> RecordService<E, SqliteRecordRepository<E>> {
    /// Builds a SQLite-backed service over the shared pool.
    pub fn open(pool: DbPool) -> RepoResult<Self> {
        Ok(Self::new(SqliteRecordRepository::try_new(pool)?))
    }
}

impl<E: Entity, R: RecordRepository<E>> RecordService<E, R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            _entity: PhantomData,
        }
    }

    /// Lists one page of live records. An empty page is not an error.
    pub fn list(&self, page: &PaginationFilter<E>) -> RepoResult<Vec<Record<E>>> {
        self.repo.list(page)
    }

    pub fn get(&self, id: i64) -> RepoResult<Option<Record<E>>> {
        self.repo.get(id)
    }

    pub fn create(&self, entity: &E) -> RepoResult<Record<E>> {
        self.repo.create(entity)
    }

    /// Creates all entities or none.
    ///
    /// Validation errors carry the index of the first failing item.
    pub fn create_batch(&self, entities: &[E]) -> RepoResult<Vec<Record<E>>> {
        self.repo.create_batch(entities)
    }

    /// Updates a live record by id.
    ///
    /// Returns `RepoError::NotFound` for missing or soft-deleted ids.
    pub fn update(&self, id: i64, entity: &E) -> RepoResult<Record<E>> {
        self.repo.update(id, entity)
    }

    /// Updates from a wire payload that carries its own id.
    pub fn update_record(&self, record: &Record<E>) -> RepoResult<Record<E>> {
        let id = record.id.ok_or(ValidationError::MissingId)?;
        self.repo.update(id, &record.data)
    }

    /// Soft-deletes records and returns the number of rows that changed.
    ///
    /// Unknown or already-deleted ids are not an error; they just do not
    /// count toward the result.
    pub fn soft_delete(&self, ids: &[i64]) -> RepoResult<usize> {
        self.repo.soft_delete(ids)
    }
}
