//! Generic record wrapper: identity plus audit timestamps around an entity.

use crate::model::entity::Entity;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// Stored entity with identity and audit timestamps.
///
/// Timestamps are Unix epoch milliseconds assigned by storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record<E> {
    /// Present on every record read from storage; absent in create payloads.
    pub id: Option<i64>,
    pub data: E,
    /// Set once on insert, never mutated.
    #[serde(default)]
    pub created_at: i64,
    /// Present only after at least one update.
    #[serde(default)]
    pub updated_at: Option<i64>,
}

impl<E: Entity> Record<E> {
    /// Decodes identity, entity columns and audit columns from one row.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            data: E::from_row(row)?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}
