//! Mall entity.

use crate::model::entity::{require_text, text_value, Entity, ValidationError};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

const NAME_MAX_CHARS: usize = 100;
const LOCATION_MAX_CHARS: usize = 200;

/// Mall fields. Both are required on writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Mall {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            location: Some(location.into()),
        }
    }
}

impl Entity for Mall {
    const TABLE: &'static str = "malls";
    const COLUMNS: &'static [&'static str] = &["name", "location"];

    fn filter_fields(&self) -> Vec<(&'static str, Value)> {
        [("name", &self.name), ("location", &self.location)]
            .into_iter()
            .filter_map(|(column, value)| {
                value
                    .as_ref()
                    .map(|text| (column, Value::Text(text.clone())))
            })
            .collect()
    }

    fn write_values(&self) -> Vec<Value> {
        vec![
            text_value(self.name.as_deref()),
            text_value(self.location.as_deref()),
        ]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", self.name.as_deref(), NAME_MAX_CHARS)?;
        require_text("location", self.location.as_deref(), LOCATION_MAX_CHARS)?;
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: Some(row.get("name")?),
            location: Some(row.get("location")?),
        })
    }
}
