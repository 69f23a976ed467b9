//! Entity capability and input validation errors.
//!
//! # Responsibility
//! - Let an entity enumerate its own columns, filter values and write values.
//! - Keep query construction free of concrete field names.
//!
//! # Invariants
//! - `filter_fields` and `write_values` follow `COLUMNS` order.
//! - `validate` runs before any write touches storage.

use rusqlite::types::Value;
use rusqlite::Row;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Capability implemented by every storable entity kind.
pub trait Entity: Sized {
    /// Backing table name.
    const TABLE: &'static str;
    /// Entity columns in declaration order. Excludes `id` and audit columns.
    const COLUMNS: &'static [&'static str];

    /// Returns `(column, value)` pairs for the fields present in a filter.
    ///
    /// Absent fields impose no constraint and are skipped.
    fn filter_fields(&self) -> Vec<(&'static str, Value)>;

    /// Returns one bind value per entry in `COLUMNS`.
    ///
    /// Absent optional fields bind as `NULL`.
    fn write_values(&self) -> Vec<Value>;

    /// Checks required fields and field formats before a write.
    fn validate(&self) -> Result<(), ValidationError>;

    /// Decodes the entity columns from a storage row by column name.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Input validation failure, reported before any storage access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingField {
        field: &'static str,
    },
    InvalidField {
        field: &'static str,
        reason: String,
    },
    EmptyBatch,
    EmptyIdList,
    MissingId,
    /// Wraps the first failing item of a batch with its input index.
    BatchItem {
        index: usize,
        source: Box<ValidationError>,
    },
}

impl ValidationError {
    /// Tags this error with a batch item index.
    pub fn at_index(self, index: usize) -> Self {
        Self::BatchItem {
            index,
            source: Box::new(self),
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField { field } => write!(f, "missing required field `{field}`"),
            Self::InvalidField { field, reason } => write!(f, "invalid field `{field}`: {reason}"),
            Self::EmptyBatch => write!(f, "batch must contain at least one item"),
            Self::EmptyIdList => write!(f, "no ids provided for deletion"),
            Self::MissingId => write!(f, "record id is required for update"),
            Self::BatchItem { index, source } => {
                write!(f, "validation failed for item {index}: {source}")
            }
        }
    }
}

impl Error for ValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::BatchItem { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Requires a non-blank text field no longer than `max_chars`.
pub(crate) fn require_text<'a>(
    field: &'static str,
    value: Option<&'a str>,
    max_chars: usize,
) -> Result<&'a str, ValidationError> {
    let value = value.ok_or(ValidationError::MissingField { field })?;
    if value.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field,
            reason: "must not be blank".to_string(),
        });
    }
    if value.chars().count() > max_chars {
        return Err(ValidationError::InvalidField {
            field,
            reason: format!("must be at most {max_chars} characters"),
        });
    }
    Ok(value)
}

pub(crate) fn text_value(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::Text(text.to_string()))
}

pub(crate) fn integer_value(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::Integer)
}

#[cfg(test)]
mod tests {
    use super::{require_text, ValidationError};

    #[test]
    fn require_text_reports_missing_blank_and_long_values() {
        assert_eq!(
            require_text("name", None, 5),
            Err(ValidationError::MissingField { field: "name" })
        );
        assert!(matches!(
            require_text("name", Some("   "), 5),
            Err(ValidationError::InvalidField { field: "name", .. })
        ));
        assert!(matches!(
            require_text("name", Some("abcdef"), 5),
            Err(ValidationError::InvalidField { field: "name", .. })
        ));
        assert_eq!(require_text("name", Some("abc"), 5), Ok("abc"));
    }

    #[test]
    fn batch_item_display_names_index_and_field() {
        let err = ValidationError::MissingField { field: "location" }.at_index(3);
        let message = err.to_string();
        assert!(message.contains("item 3"));
        assert!(message.contains("`location`"));
    }
}
