//! User entity.

use crate::model::entity::{integer_value, require_text, text_value, Entity, ValidationError};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

const NAME_MAX_CHARS: usize = 100;
const AGE_MAX: i64 = 150;

/// User fields. Both are required on create and update, and optional as a
/// list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Compared case-insensitively by storage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
}

impl User {
    pub fn new(name: impl Into<String>, age: i64) -> Self {
        Self {
            name: Some(name.into()),
            age: Some(age),
        }
    }
}

impl Entity for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &["name", "age"];

    fn filter_fields(&self) -> Vec<(&'static str, Value)> {
        let mut fields = Vec::new();
        if let Some(name) = &self.name {
            fields.push(("name", Value::Text(name.clone())));
        }
        if let Some(age) = self.age {
            fields.push(("age", Value::Integer(age)));
        }
        fields
    }

    fn write_values(&self) -> Vec<Value> {
        vec![text_value(self.name.as_deref()), integer_value(self.age)]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", self.name.as_deref(), NAME_MAX_CHARS)?;
        let age = self.age.ok_or(ValidationError::MissingField { field: "age" })?;
        if !(0..=AGE_MAX).contains(&age) {
            return Err(ValidationError::InvalidField {
                field: "age",
                reason: format!("must be between 0 and {AGE_MAX}"),
            });
        }
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: Some(row.get("name")?),
            age: Some(row.get("age")?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::User;
    use crate::model::entity::{Entity, ValidationError};
    use rusqlite::types::Value;

    #[test]
    fn filter_fields_skip_absent_values_and_keep_column_order() {
        let only_age = User {
            name: None,
            age: Some(30),
        };
        assert_eq!(only_age.filter_fields(), vec![("age", Value::Integer(30))]);

        let both = User::new("Alice", 30);
        let columns: Vec<_> = both.filter_fields().into_iter().map(|(c, _)| c).collect();
        assert_eq!(columns, User::COLUMNS);
    }

    #[test]
    fn validate_requires_name_and_age_in_range() {
        assert!(User::new("Alice", 30).validate().is_ok());

        let missing_age = User {
            name: Some("Alice".to_string()),
            age: None,
        };
        assert_eq!(
            missing_age.validate(),
            Err(ValidationError::MissingField { field: "age" })
        );

        assert!(matches!(
            User::new("Alice", -1).validate(),
            Err(ValidationError::InvalidField { field: "age", .. })
        ));
        assert!(matches!(
            User::default().validate(),
            Err(ValidationError::MissingField { field: "name" })
        ));
    }
}
