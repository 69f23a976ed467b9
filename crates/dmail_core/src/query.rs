//! SQL construction for record list/create/update/soft-delete statements.
//!
//! # Responsibility
//! - Render SQL text plus positional bind values for every record operation.
//! - Stay generic over entity shape through the `Entity` capability.
//!
//! # Invariants
//! - Bind values are always in clause-append order.
//! - Every read and update is constrained to live rows (`deleted_at IS NULL`).
//! - Clauses are only appended for filters that are present.

use crate::model::entity::{Entity, ValidationError};
use crate::model::pagination::{PageMode, PaginationFilter};
use rusqlite::types::Value;

/// Predicate selecting rows whose soft-delete marker is unset.
pub const LIVE_ROW_PREDICATE: &str = "deleted_at IS NULL";

/// Server-side "now" in epoch milliseconds.
pub const NOW_EPOCH_MS_SQL: &str = "(strftime('%s', 'now') * 1000)";

/// Rendered statement ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Accumulates SQL fragments and their bind values in append order.
#[derive(Debug, Default)]
pub struct SqlBuilder {
    sql: String,
    params: Vec<Value>,
}

impl SqlBuilder {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            sql: base.into(),
            params: Vec::new(),
        }
    }

    /// Appends a fragment that carries no bind values.
    pub fn push(&mut self, fragment: &str) -> &mut Self {
        self.sql.push_str(fragment);
        self
    }

    /// Appends a fragment with exactly one `?` and its bind value.
    pub fn push_bound(&mut self, fragment: &str, value: impl Into<Value>) -> &mut Self {
        self.sql.push_str(fragment);
        self.params.push(value.into());
        self
    }

    /// Appends `(?, ?, ...)` with one placeholder per value.
    pub fn push_group(&mut self, values: impl IntoIterator<Item = Value>) -> &mut Self {
        self.sql.push('(');
        for (index, value) in values.into_iter().enumerate() {
            if index > 0 {
                self.sql.push_str(", ");
            }
            self.sql.push('?');
            self.params.push(value);
        }
        self.sql.push(')');
        self
    }

    pub fn build(self) -> BuiltQuery {
        BuiltQuery {
            sql: self.sql,
            params: self.params,
        }
    }
}

/// Column list returned by every record query: id, entity columns, audit columns.
pub fn record_columns<E: Entity>() -> String {
    let mut columns = vec!["id"];
    columns.extend_from_slice(E::COLUMNS);
    columns.extend_from_slice(&["created_at", "updated_at"]);
    columns.join(", ")
}

/// Builds a filtered, paginated SELECT over live rows.
pub fn build_list<E: Entity>(page: &PaginationFilter<E>) -> BuiltQuery {
    let mut builder = SqlBuilder::new(format!(
        "SELECT {} FROM {} WHERE {LIVE_ROW_PREDICATE}",
        record_columns::<E>(),
        E::TABLE
    ));

    for (column, value) in page.filter.filter_fields() {
        builder.push_bound(&format!(" AND {column} = ?"), value);
    }

    match page.mode() {
        PageMode::Cursor { after_id, limit } => {
            builder
                .push_bound(" AND id > ?", after_id)
                .push(" ORDER BY id ASC")
                .push_bound(" LIMIT ?", limit);
        }
        PageMode::Offset { limit, offset } => {
            builder
                .push(" ORDER BY id ASC")
                .push_bound(" LIMIT ?", limit)
                .push_bound(" OFFSET ?", offset);
        }
    }

    builder.build()
}

/// Builds a SELECT of one live row by id.
pub fn build_get<E: Entity>(id: i64) -> BuiltQuery {
    let mut builder = SqlBuilder::new(format!(
        "SELECT {} FROM {} WHERE {LIVE_ROW_PREDICATE}",
        record_columns::<E>(),
        E::TABLE
    ));
    builder.push_bound(" AND id = ?", id);
    builder.build()
}

/// Builds a single-row INSERT that returns the created row.
pub fn build_insert<E: Entity>(entity: &E) -> BuiltQuery {
    let mut builder = insert_head::<E>();
    builder.push_group(entity.write_values());
    builder.push(&returning_clause::<E>());
    builder.build()
}

/// Builds one multi-row INSERT with a value group per entity, in input order.
pub fn build_batch_insert<E: Entity>(entities: &[E]) -> Result<BuiltQuery, ValidationError> {
    if entities.is_empty() {
        return Err(ValidationError::EmptyBatch);
    }

    let mut builder = insert_head::<E>();
    for (index, entity) in entities.iter().enumerate() {
        if index > 0 {
            builder.push(", ");
        }
        builder.push_group(entity.write_values());
    }
    builder.push(&returning_clause::<E>());
    Ok(builder.build())
}

/// Builds an UPDATE of every entity column on one live row.
pub fn build_update<E: Entity>(id: i64, entity: &E) -> BuiltQuery {
    let mut builder = SqlBuilder::new(format!("UPDATE {} SET ", E::TABLE));
    for (column, value) in E::COLUMNS.iter().zip(entity.write_values()) {
        builder.push_bound(&format!("{column} = ?, "), value);
    }
    builder
        .push(&format!("updated_at = {NOW_EPOCH_MS_SQL}"))
        .push_bound(" WHERE id = ?", id)
        .push(&format!(" AND {LIVE_ROW_PREDICATE}"))
        .push(&returning_clause::<E>());
    builder.build()
}

/// Builds one UPDATE that sets the soft-delete marker on every listed live row.
pub fn build_soft_delete<E: Entity>(ids: &[i64]) -> Result<BuiltQuery, ValidationError> {
    if ids.is_empty() {
        return Err(ValidationError::EmptyIdList);
    }

    let mut builder = SqlBuilder::new(format!(
        "UPDATE {} SET deleted_at = {NOW_EPOCH_MS_SQL} WHERE {LIVE_ROW_PREDICATE} AND id IN ",
        E::TABLE
    ));
    builder.push_group(ids.iter().copied().map(Value::Integer));
    Ok(builder.build())
}

fn insert_head<E: Entity>() -> SqlBuilder {
    SqlBuilder::new(format!(
        "INSERT INTO {} ({}) VALUES ",
        E::TABLE,
        E::COLUMNS.join(", ")
    ))
}

fn returning_clause<E: Entity>() -> String {
    format!(" RETURNING {}", record_columns::<E>())
}

#[cfg(test)]
mod tests {
    use super::{
        build_batch_insert, build_get, build_insert, build_list, build_soft_delete, build_update,
    };
    use crate::model::entity::ValidationError;
    use crate::model::mall::Mall;
    use crate::model::pagination::PaginationFilter;
    use crate::model::user::User;
    use rusqlite::types::Value;

    #[test]
    fn list_without_filters_uses_offset_mode() {
        let query = build_list(&PaginationFilter::new(User::default()).with_page(2, 5));
        assert_eq!(
            query.sql,
            "SELECT id, name, age, created_at, updated_at FROM users \
             WHERE deleted_at IS NULL ORDER BY id ASC LIMIT ? OFFSET ?"
        );
        assert_eq!(query.params, vec![Value::Integer(5), Value::Integer(10)]);
    }

    #[test]
    fn list_appends_only_present_filters_in_declaration_order() {
        let filter = User {
            name: Some("Alice".to_string()),
            age: Some(30),
        };
        let query = build_list(&PaginationFilter::new(filter).with_page(0, 5));
        assert!(query
            .sql
            .contains("WHERE deleted_at IS NULL AND name = ? AND age = ? ORDER BY"));
        assert_eq!(
            query.params,
            vec![
                Value::Text("Alice".to_string()),
                Value::Integer(30),
                Value::Integer(5),
                Value::Integer(0),
            ]
        );

        let age_only = User {
            name: None,
            age: Some(30),
        };
        let query = build_list(&PaginationFilter::new(age_only));
        assert!(query.sql.contains("AND age = ?"));
        assert!(!query.sql.contains("name = ?"));
        assert!(!query.sql.contains("1 = 1"));
    }

    #[test]
    fn list_with_cursor_ignores_page_number() {
        let filter = Mall {
            name: None,
            location: Some("Downtown".to_string()),
        };
        let page = PaginationFilter::new(filter).with_page(7, 3).with_cursor(40);
        let query = build_list(&page);
        assert_eq!(
            query.sql,
            "SELECT id, name, location, created_at, updated_at FROM malls \
             WHERE deleted_at IS NULL AND location = ? AND id > ? ORDER BY id ASC LIMIT ?"
        );
        assert_eq!(
            query.params,
            vec![
                Value::Text("Downtown".to_string()),
                Value::Integer(40),
                Value::Integer(3),
            ]
        );
    }

    #[test]
    fn get_is_constrained_to_live_rows() {
        let query = build_get::<User>(9);
        assert!(query.sql.ends_with("WHERE deleted_at IS NULL AND id = ?"));
        assert_eq!(query.params, vec![Value::Integer(9)]);
    }

    #[test]
    fn insert_returns_created_row() {
        let query = build_insert(&User::new("Alice", 30));
        assert_eq!(
            query.sql,
            "INSERT INTO users (name, age) VALUES (?, ?) \
             RETURNING id, name, age, created_at, updated_at"
        );
        assert_eq!(
            query.params,
            vec![Value::Text("Alice".to_string()), Value::Integer(30)]
        );
    }

    #[test]
    fn batch_insert_emits_one_group_per_item_in_input_order() {
        let malls = vec![Mall::new("A", "North"), Mall::new("B", "South")];
        let query = build_batch_insert(&malls).unwrap();
        assert_eq!(
            query.sql,
            "INSERT INTO malls (name, location) VALUES (?, ?), (?, ?) \
             RETURNING id, name, location, created_at, updated_at"
        );
        assert_eq!(
            query.params,
            vec![
                Value::Text("A".to_string()),
                Value::Text("North".to_string()),
                Value::Text("B".to_string()),
                Value::Text("South".to_string()),
            ]
        );
    }

    #[test]
    fn batch_insert_rejects_empty_input() {
        let err = build_batch_insert::<Mall>(&[]).unwrap_err();
        assert_eq!(err, ValidationError::EmptyBatch);
    }

    #[test]
    fn update_sets_all_columns_and_refreshes_timestamp() {
        let query = build_update(7, &Mall::new("Central", "Uptown"));
        assert_eq!(
            query.sql,
            "UPDATE malls SET name = ?, location = ?, \
             updated_at = (strftime('%s', 'now') * 1000) \
             WHERE id = ? AND deleted_at IS NULL \
             RETURNING id, name, location, created_at, updated_at"
        );
        assert_eq!(
            query.params,
            vec![
                Value::Text("Central".to_string()),
                Value::Text("Uptown".to_string()),
                Value::Integer(7),
            ]
        );
    }

    #[test]
    fn soft_delete_uses_one_placeholder_per_id() {
        let query = build_soft_delete::<User>(&[1, 2, 999]).unwrap();
        assert_eq!(
            query.sql,
            "UPDATE users SET deleted_at = (strftime('%s', 'now') * 1000) \
             WHERE deleted_at IS NULL AND id IN (?, ?, ?)"
        );
        assert_eq!(
            query.params,
            vec![Value::Integer(1), Value::Integer(2), Value::Integer(999)]
        );
    }

    #[test]
    fn soft_delete_rejects_empty_id_list() {
        let err = build_soft_delete::<User>(&[]).unwrap_err();
        assert_eq!(err, ValidationError::EmptyIdList);
    }
}
