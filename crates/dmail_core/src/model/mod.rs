//! Record data model shared by every entity kind.
//!
//! # Responsibility
//! - Define the `Entity` capability consumed by query construction.
//! - Define the generic `Record<E>` wrapper and `PaginationFilter<E>` input.
//! - Provide the concrete `User` and `Mall` entity kinds.
//!
//! # Invariants
//! - Entities carry no identity or audit timestamps themselves.
//! - Deletion is a soft-delete marker on the row, never a hard delete.

pub mod entity;
pub mod mall;
pub mod pagination;
pub mod record;
pub mod user;
