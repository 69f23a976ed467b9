//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define record data-access contracts shared by every entity kind.
//! - Isolate SQLite execution and row decoding from service callers.
//!
//! # Invariants
//! - Repository writes must call `Entity::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `Validation`) in
//!   addition to storage errors.

pub mod record_repo;
